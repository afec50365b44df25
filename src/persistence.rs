//! Plain-data agent state.
//!
//! [`AgentState`] holds everything about an agent that serializes cleanly:
//! configuration, exploration rate, step counter and the experience buffer.
//! The learned weights travel separately through the weight file derived from
//! the agent's name ([`AgentConfig::weights_path`]), and the telemetry sink is
//! supplied again when the state is attached to a runtime.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::error::{BanditError, PathContext, Result};
use crate::replay_buffer::ExperienceBuffer;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentState {
    pub config: AgentConfig,
    pub epsilon: f32,
    pub step_counter: u64,
    pub buffer: ExperienceBuffer,
}

impl AgentState {
    /// Initial learning state for a config.
    pub fn fresh(config: AgentConfig) -> Self {
        AgentState {
            epsilon: config.epsilon,
            step_counter: 0,
            buffer: ExperienceBuffer::new(config.memory_capacity),
            config,
        }
    }

    /// Check that the state is consistent with its own config.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BanditError::invalid_parameter("epsilon", "must be within [0, 1]"));
        }
        if self.buffer.capacity() != self.config.memory_capacity {
            return Err(BanditError::invalid_parameter(
                "buffer",
                "capacity differs from memory_capacity",
            ));
        }
        if self.buffer.len() > self.buffer.capacity() {
            return Err(BanditError::invalid_parameter("buffer", "holds more observations than its capacity"));
        }
        for observation in self.buffer.iter() {
            if observation.state.len() != self.config.state_size {
                return Err(BanditError::dimension_mismatch(
                    format!("stored state of length {}", self.config.state_size),
                    format!("{}", observation.state.len()),
                ));
            }
            if !observation.reward.is_finite() || observation.state.iter().any(|v| !v.is_finite()) {
                return Err(BanditError::NumericalError("non-finite value in stored observation".to_string()));
            }
            if let Some(&action) = observation.actions.iter().find(|&&a| a >= self.config.action_size) {
                return Err(BanditError::InvalidAction {
                    action,
                    max_actions: self.config.action_size,
                });
            }
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?).at_path(path)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).at_path(path)?;
        let state: AgentState = serde_json::from_slice(&data).at_path(path)?;
        state.validate()?;
        Ok(state)
    }
}
