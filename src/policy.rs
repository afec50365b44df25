use ndarray::ArrayView1;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};
use crate::replay_buffer::Action;

/// Epsilon-greedy exploration with multiplicative decay.
///
/// Greedy selection *minimises* the predicted value: the agent estimates
/// costs such as runtimes, so lower is better.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    pub epsilon: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f32, epsilon_min: f32, epsilon_decay: f32) -> Self {
        EpsilonGreedy {
            epsilon,
            epsilon_min,
            epsilon_decay,
        }
    }

    /// Draw from `[0, 1)`; explore when the draw falls below epsilon.
    pub fn should_explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f32>() < self.epsilon
    }

    /// `num_return` distinct action indices drawn uniformly at random.
    pub fn random_actions<R: Rng + ?Sized>(
        action_size: usize,
        num_return: usize,
        rng: &mut R,
    ) -> Result<Vec<Action>> {
        check_request(action_size, num_return)?;
        Ok(index::sample(rng, action_size, num_return.min(action_size)).into_vec())
    }

    /// Indices of the `num_return` lowest values, in ascending order of value.
    ///
    /// Ties keep the lower index first.
    pub fn greedy_actions(values: ArrayView1<f32>, num_return: usize) -> Result<Vec<Action>> {
        check_request(values.len(), num_return)?;
        if values.iter().any(|v| v.is_nan()) {
            return Err(BanditError::NumericalError("NaN in value estimates".to_string()));
        }
        let mut order: Vec<Action> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        order.truncate(num_return);
        Ok(order)
    }

    /// Shrink epsilon by `epsilon_decay` while it is above the floor.
    ///
    /// The result is clamped to `epsilon_min`. Returns whether epsilon changed.
    pub fn decay(&mut self) -> bool {
        if self.epsilon > self.epsilon_min {
            self.epsilon = (self.epsilon * (1.0 - self.epsilon_decay)).max(self.epsilon_min);
            true
        } else {
            false
        }
    }
}

fn check_request(action_size: usize, num_return: usize) -> Result<()> {
    if num_return == 0 {
        return Err(BanditError::invalid_parameter("num_return", "must request at least one action"));
    }
    if action_size == 0 {
        return Err(BanditError::invalid_parameter("action_size", "action space is empty"));
    }
    Ok(())
}
