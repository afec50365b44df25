use std::collections::VecDeque;

use ndarray::Array1;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};

/// Index of a discrete action.
pub type Action = usize;

/// One observed interaction: the context, the action(s) taken and the reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub state: Array1<f32>,
    pub actions: Vec<Action>,
    pub reward: f32,
}

impl Observation {
    pub fn new(state: Array1<f32>, actions: Vec<Action>, reward: f32) -> Self {
        Observation { state, actions, reward }
    }
}

/// Bounded FIFO ring of observations.
///
/// Once `capacity` is reached every push evicts the oldest observation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperienceBuffer {
    buffer: VecDeque<Observation>,
    capacity: usize,
}

impl ExperienceBuffer {
    pub fn new(capacity: usize) -> Self {
        ExperienceBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, observation: Observation) {
        if self.capacity == 0 {
            return;
        }
        while self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(observation);
    }

    /// Draw `min(batch_size, len)` distinct observations uniformly at random.
    ///
    /// Sampling an empty buffer is an invalid precondition and fails with
    /// [`BanditError::EmptyBuffer`].
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Observation>> {
        if self.buffer.is_empty() {
            return Err(BanditError::EmptyBuffer { requested: batch_size });
        }
        let amount = batch_size.min(self.buffer.len());
        Ok(index::sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Observations from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
