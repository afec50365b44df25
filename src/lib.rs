//! # bandit_agent - contextual-bandit agent with experience replay
//!
//! An agent that learns to pick a discrete action (for example a compiler-flag
//! combination) from a numeric state vector (program features), using an
//! observed scalar reward (a runtime) where lower is better. It is a
//! single-step bandit: there are no episodes and no discounted returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bandit_agent::agent::{Agent, AgentBuilder};
//! use bandit_agent::telemetry::ScalarWriter;
//! use ndarray::array;
//!
//! let writer = ScalarWriter::create("./tf_logs").unwrap();
//! let mut agent: Agent = AgentBuilder::new(3, 8, "gcc_flags")
//!     .batch_size(32)
//!     .telemetry(Box::new(writer))
//!     .build()
//!     .unwrap();
//!
//! let features = array![0.5, 12.0, 1.0];
//! let flags = agent.act_many(features.view(), 3).unwrap();
//! agent.remember(features, &flags[..1], 4.2).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - the agent: remember, act, replay, telemetry, capture/restore
//! - [`config`] - agent configuration and replay cadence
//! - [`replay_buffer`] - observations and the bounded experience buffer
//! - [`policy`] - epsilon-greedy exploration
//! - [`loss`] - pseudo-Huber training loss
//! - [`model`] - value approximator trait and the default network
//! - [`layers`], [`activations`], [`optimizer`] - network building blocks
//! - [`persistence`] - serializable agent state
//! - [`telemetry`] - scalar sinks for training progress
//! - [`error`] - error type and result alias

pub mod activations;
pub mod agent;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod persistence;
pub mod policy;
pub mod replay_buffer;
pub mod telemetry;

pub use agent::{Agent, AgentBuilder};
pub use config::{AgentConfig, ReplayCadence};
pub use error::{BanditError, Result};
pub use persistence::AgentState;

#[cfg(test)]
mod tests;
