use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BanditError, PathContext, Result};

/// When `remember` triggers a replay pass, based on the step counter after
/// the increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayCadence {
    /// Replay on every step except multiples of `n` (19 of every 20 for `n = 20`).
    SkipEveryNth(u64),
    /// Replay only on multiples of `n`.
    EveryNth(u64),
    /// Never replay from `remember`; the caller drives `replay` itself.
    Manual,
}

impl ReplayCadence {
    pub fn should_replay(&self, step: u64) -> bool {
        match *self {
            ReplayCadence::SkipEveryNth(n) => step % n != 0,
            ReplayCadence::EveryNth(n) => step % n == 0,
            ReplayCadence::Manual => false,
        }
    }

    fn period(&self) -> Option<u64> {
        match *self {
            ReplayCadence::SkipEveryNth(n) | ReplayCadence::EveryNth(n) => Some(n),
            ReplayCadence::Manual => None,
        }
    }
}

impl Default for ReplayCadence {
    fn default() -> Self {
        ReplayCadence::SkipEveryNth(20)
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_memory_capacity() -> usize {
    2000
}

fn default_epsilon() -> f32 {
    1.0
}

fn default_epsilon_min() -> f32 {
    0.001
}

fn default_epsilon_decay() -> f32 {
    0.15
}

fn default_learning_rate() -> f32 {
    0.001
}

fn default_weights_dir() -> PathBuf {
    PathBuf::from("./save/agents")
}

/// Hyperparameters and identity of one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub state_size: usize,
    pub action_size: usize,
    /// Keys the weight file, so it must be usable inside a file name.
    pub name: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
    #[serde(default = "default_epsilon_min")]
    pub epsilon_min: f32,
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f32,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default)]
    pub replay_cadence: ReplayCadence,
    #[serde(default = "default_weights_dir")]
    pub weights_dir: PathBuf,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn new<S: Into<String>>(state_size: usize, action_size: usize, name: S) -> Self {
        AgentConfig {
            state_size,
            action_size,
            name: name.into(),
            batch_size: default_batch_size(),
            memory_capacity: default_memory_capacity(),
            epsilon: default_epsilon(),
            epsilon_min: default_epsilon_min(),
            epsilon_decay: default_epsilon_decay(),
            learning_rate: default_learning_rate(),
            replay_cadence: ReplayCadence::default(),
            weights_dir: default_weights_dir(),
            seed: None,
        }
    }

    /// Load a config from a JSON file. Missing optional fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).at_path(path)?;
        let config: AgentConfig = serde_json::from_str(&data).at_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the weight file for this agent's name.
    pub fn weights_path(&self) -> PathBuf {
        self.weights_dir.join(format!("agent_weights_{}.bin", self.name))
    }

    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 {
            return Err(BanditError::invalid_parameter("state_size", "must be greater than 0"));
        }
        if self.action_size == 0 {
            return Err(BanditError::invalid_parameter("action_size", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(BanditError::invalid_parameter("batch_size", "must be greater than 0"));
        }
        if self.memory_capacity == 0 {
            return Err(BanditError::invalid_parameter("memory_capacity", "must be greater than 0"));
        }
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(BanditError::invalid_parameter(
                "name",
                "must be a non-empty file-name component",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BanditError::invalid_parameter("epsilon", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(BanditError::invalid_parameter("epsilon_min", "must be within [0, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay < 1.0) {
            return Err(BanditError::invalid_parameter("epsilon_decay", "must be within (0, 1)"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(BanditError::invalid_parameter("learning_rate", "must be a positive number"));
        }
        if self.replay_cadence.period() == Some(0) {
            return Err(BanditError::invalid_parameter("replay_cadence", "period must be greater than 0"));
        }
        Ok(())
    }
}
