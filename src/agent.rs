use std::path::PathBuf;

use log::{debug, info};
use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{AgentConfig, ReplayCadence};
use crate::error::{BanditError, Result};
use crate::loss::PseudoHuber;
use crate::model::{NeuralNetwork, ValueModel};
use crate::persistence::AgentState;
use crate::policy::EpsilonGreedy;
use crate::replay_buffer::{Action, ExperienceBuffer, Observation};
use crate::telemetry::{NullSink, TelemetrySink};

/// Live resources of an agent: the approximator, the telemetry sink and the
/// random source. None of these are part of [`AgentState`].
struct Runtime<M> {
    model: M,
    telemetry: Box<dyn TelemetrySink>,
    rng: StdRng,
}

/// Contextual-bandit agent.
///
/// Learns which action to pick for a state from observed rewards, where a
/// lower reward is better (e.g. a benchmark runtime). Observations are kept in
/// a bounded buffer and replayed in mini-batches; each replayed observation
/// moves only the value of the action that was actually taken.
///
/// # Example
///
/// ```rust,no_run
/// use bandit_agent::agent::Agent;
/// use bandit_agent::config::AgentConfig;
/// use bandit_agent::telemetry::NullSink;
/// use ndarray::array;
///
/// let config = AgentConfig::new(4, 3, "flags");
/// let mut agent: Agent = Agent::new(config, Box::new(NullSink)).unwrap();
///
/// let state = array![0.2, 1.0, 0.0, 3.5];
/// let action = agent.act(state.view()).unwrap();
/// // ... run the benchmark with `action` and measure its runtime ...
/// agent.remember(state, &[action], 1.37).unwrap();
///
/// let snapshot = agent.capture().unwrap();
/// let restored: Agent = Agent::attach_runtime(snapshot, Box::new(NullSink)).unwrap();
/// ```
pub struct Agent<M: ValueModel = NeuralNetwork> {
    config: AgentConfig,
    policy: EpsilonGreedy,
    step_counter: u64,
    buffer: ExperienceBuffer,
    runtime: Runtime<M>,
}

impl<M: ValueModel> Agent<M> {
    /// Create an agent for `config`.
    ///
    /// Weights previously saved under the same name are picked up, so this is
    /// equivalent to attaching a fresh [`AgentState`].
    pub fn new(config: AgentConfig, telemetry: Box<dyn TelemetrySink>) -> Result<Self> {
        Self::attach_runtime(AgentState::fresh(config), telemetry)
    }

    /// Rebuild a live agent from its plain-data state.
    ///
    /// A fresh model is built for the stored sizes and then loaded from the
    /// weight file derived from the agent's name. A missing weight file is
    /// not an error: the agent starts from an untrained model.
    pub fn attach_runtime(state: AgentState, telemetry: Box<dyn TelemetrySink>) -> Result<Self> {
        state.validate()?;
        let AgentState {
            config,
            epsilon,
            step_counter,
            buffer,
        } = state;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut model = M::build(config.state_size, config.action_size, config.learning_rate, &mut rng)?;

        let weights_path = config.weights_path();
        if weights_path.exists() {
            model.load_weights(&weights_path)?;
            info!("agent '{}' loaded weights from {}", config.name, weights_path.display());
        } else {
            info!(
                "model weights not found at {}, training agent '{}' from base model",
                weights_path.display(),
                config.name
            );
        }

        debug!(
            "agent '{}' attached: state_size={} action_size={} epsilon={} step={} buffered={}",
            config.name,
            config.state_size,
            config.action_size,
            epsilon,
            step_counter,
            buffer.len()
        );

        Ok(Agent {
            policy: EpsilonGreedy::new(epsilon, config.epsilon_min, config.epsilon_decay),
            config,
            step_counter,
            buffer,
            runtime: Runtime { model, telemetry, rng },
        })
    }

    /// Store an observation and, depending on the replay cadence, train.
    ///
    /// This may run a full replay pass before returning. Training failures
    /// are returned to the caller; the observation stays stored either way.
    /// NaN or infinite rewards and state features are rejected up front and
    /// never reach the buffer.
    pub fn remember(&mut self, state: Array1<f32>, actions: &[Action], reward: f32) -> Result<()> {
        self.check_state(state.view())?;
        if !reward.is_finite() {
            return Err(BanditError::NumericalError(format!("non-finite reward {}", reward)));
        }
        if state.iter().any(|v| !v.is_finite()) {
            return Err(BanditError::NumericalError("non-finite state feature".to_string()));
        }
        if actions.is_empty() {
            return Err(BanditError::invalid_parameter("actions", "at least one action index is required"));
        }
        if let Some(&action) = actions.iter().find(|&&a| a >= self.config.action_size) {
            return Err(BanditError::InvalidAction {
                action,
                max_actions: self.config.action_size,
            });
        }

        self.buffer.push(Observation::new(state, actions.to_vec(), reward));
        self.step_counter += 1;

        if self.config.replay_cadence.should_replay(self.step_counter) {
            self.replay()?;
        }
        Ok(())
    }

    /// Pick one action for `state`.
    pub fn act(&mut self, state: ArrayView1<f32>) -> Result<Action> {
        let actions = self.act_many(state, 1)?;
        actions
            .first()
            .copied()
            .ok_or_else(|| BanditError::NumericalError("no action selected".to_string()))
    }

    /// Pick `num_return` distinct actions for `state`.
    ///
    /// With probability epsilon the actions are uniformly random; otherwise
    /// they are the actions with the lowest predicted values, best first.
    /// At most `action_size` actions are returned.
    pub fn act_many(&mut self, state: ArrayView1<f32>, num_return: usize) -> Result<Vec<Action>> {
        self.check_state(state)?;
        if self.policy.should_explore(&mut self.runtime.rng) {
            EpsilonGreedy::random_actions(self.config.action_size, num_return, &mut self.runtime.rng)
        } else {
            let values = self.runtime.model.predict(state)?;
            EpsilonGreedy::greedy_actions(values.view(), num_return)
        }
    }

    /// Train on a mini-batch sampled from the buffer, then decay epsilon.
    ///
    /// Returns the mean loss over the batch.
    pub fn replay(&mut self) -> Result<f32> {
        let batch = self.buffer.sample(self.config.batch_size, &mut self.runtime.rng)?;
        let batch_len = batch.len();

        let mut total_loss = 0.0;
        for observation in batch {
            let mut target = self.runtime.model.predict(observation.state.view())?;
            for &action in &observation.actions {
                target[action] = observation.reward;
            }
            total_loss += self
                .runtime
                .model
                .fit(observation.state.view(), target.view(), &PseudoHuber)?;
        }
        let mean_loss = total_loss / batch_len as f32;

        self.policy.decay();
        debug!(
            "agent '{}' replayed {} observations at step {}: loss={} epsilon={}",
            self.config.name, batch_len, self.step_counter, mean_loss, self.policy.epsilon
        );

        self.log_stat("loss", mean_loss)?;
        self.log_stat("epsilon", self.policy.epsilon)?;
        Ok(mean_loss)
    }

    /// Emit `"{name}_{tag}"` at the current step and flush the sink.
    pub fn log_stat(&mut self, tag: &str, value: f32) -> Result<()> {
        let tag = format!("{}_{}", self.config.name, tag);
        self.runtime.telemetry.add_scalar(&tag, value, self.step_counter)?;
        self.runtime.telemetry.flush()
    }

    /// Save the model weights and return the plain-data state.
    pub fn capture(&self) -> Result<AgentState> {
        let weights_path = self.weights_path();
        self.runtime.model.save_weights(&weights_path)?;
        info!("agent '{}' saved weights to {}", self.config.name, weights_path.display());

        Ok(AgentState {
            config: self.config.clone(),
            epsilon: self.policy.epsilon,
            step_counter: self.step_counter,
            buffer: self.buffer.clone(),
        })
    }

    /// Value estimates of the live model for `state`.
    pub fn predict(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state(state)?;
        self.runtime.model.predict(state)
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(BanditError::invalid_parameter("epsilon", "must be within [0, 1]"));
        }
        self.policy.epsilon = epsilon;
        Ok(())
    }

    pub fn step_counter(&self) -> u64 {
        self.step_counter
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn buffer(&self) -> &ExperienceBuffer {
        &self.buffer
    }

    pub fn weights_path(&self) -> PathBuf {
        self.config.weights_path()
    }

    pub fn model(&self) -> &M {
        &self.runtime.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.runtime.model
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.config.state_size {
            return Err(BanditError::dimension_mismatch(
                format!("state of length {}", self.config.state_size),
                format!("{}", state.len()),
            ));
        }
        Ok(())
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    config: AgentConfig,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl AgentBuilder {
    pub fn new<S: Into<String>>(state_size: usize, action_size: usize, name: S) -> Self {
        AgentBuilder {
            config: AgentConfig::new(state_size, action_size, name),
            telemetry: None,
        }
    }

    pub fn from_config(config: AgentConfig) -> Self {
        AgentBuilder { config, telemetry: None }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.config.memory_capacity = capacity;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn epsilon_min(mut self, epsilon_min: f32) -> Self {
        self.config.epsilon_min = epsilon_min;
        self
    }

    pub fn epsilon_decay(mut self, epsilon_decay: f32) -> Self {
        self.config.epsilon_decay = epsilon_decay;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn replay_cadence(mut self, cadence: ReplayCadence) -> Self {
        self.config.replay_cadence = cadence;
        self
    }

    pub fn weights_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.weights_dir = dir.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sink for training progress; defaults to [`NullSink`].
    pub fn telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build<M: ValueModel>(self) -> Result<Agent<M>> {
        let telemetry = self.telemetry.unwrap_or_else(|| Box::new(NullSink));
        Agent::new(self.config, telemetry)
    }
}
