//! Value-function approximators.
//!
//! The agent talks to its approximator only through [`ValueModel`]: predict a
//! value per action, take one gradient step toward a target vector, and move
//! learned parameters in and out of a file. [`NeuralNetwork`] is the default
//! implementation, a small fully connected network sized from the state and
//! action counts.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{BanditError, PathContext, Result};
use crate::layers::DenseLayer;
use crate::loss::Loss;
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper};

/// Maps a state vector to one value estimate per action.
pub trait ValueModel {
    /// Build a fresh, untrained model.
    fn build(state_size: usize, action_size: usize, learning_rate: f32, rng: &mut dyn RngCore) -> Result<Self>
    where
        Self: Sized;

    /// Per-action value estimates for `state`.
    fn predict(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>>;

    /// One gradient step fitting `predict(state)` towards `target`.
    ///
    /// Returns the loss measured before the update.
    fn fit(&mut self, state: ArrayView1<f32>, target: ArrayView1<f32>, loss: &dyn Loss) -> Result<f32>;

    fn save_weights(&self, path: &Path) -> Result<()>;

    fn load_weights(&mut self, path: &Path) -> Result<()>;
}

/// A feed-forward network with dense layers and its optimizer state.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
    pub learning_rate: f32,
}

impl NeuralNetwork {
    /// Create a network from layer sizes (input first, output last) and one
    /// activation per non-input layer.
    pub fn new(
        layer_sizes: &[usize],
        activations: &[Activation],
        learning_rate: f32,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(BanditError::invalid_parameter(
                "layer_sizes",
                "network needs at least an input and an output layer",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(BanditError::invalid_parameter(
                "activations",
                "one activation is required per non-input layer",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(BanditError::invalid_parameter("layer_sizes", "every layer needs at least one unit"));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, &mut *rng))
            .collect::<Vec<_>>();
        let optimizer = OptimizerWrapper::Adam(Adam::default_for(&layers));

        Ok(NeuralNetwork { layers, optimizer, learning_rate })
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(DenseLayer::input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(DenseLayer::output_size).unwrap_or(0)
    }

    /// Layer shapes as `(input, output)` pairs, used to check that a weight
    /// file belongs to this architecture.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(|l| (l.input_size(), l.output_size())).collect()
    }

    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view())?;
        }
        Ok(current)
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One optimizer step on a batch of `(input, target)` rows.
    pub fn train_batch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>, loss: &dyn Loss) -> Result<f32> {
        let outputs = self.forward_batch(inputs)?;
        if outputs.dim() != targets.dim() {
            return Err(BanditError::dimension_mismatch(
                format!("targets of shape {:?}", outputs.dim()),
                format!("{:?}", targets.dim()),
            ));
        }
        let value = loss.compute_batch(targets, outputs.view());
        if !value.is_finite() {
            return Err(BanditError::NumericalError(format!("non-finite training loss {}", value)));
        }

        let output_errors = loss.gradient_batch(targets, outputs.view());
        let gradients = self.backward_batch(output_errors.view())?;
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, self.learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, self.learning_rate);
        }
        self.optimizer.step();

        Ok(value)
    }
}

impl ValueModel for NeuralNetwork {
    /// Two hidden ReLU layers of `(state_size + action_size) / 2` units and a
    /// linear output layer.
    fn build(state_size: usize, action_size: usize, learning_rate: f32, rng: &mut dyn RngCore) -> Result<Self> {
        let hidden = ((state_size + action_size) / 2).max(1);
        NeuralNetwork::new(
            &[state_size, hidden, hidden, action_size],
            &[Activation::Relu, Activation::Relu, Activation::Linear],
            learning_rate,
            rng,
        )
    }

    fn predict(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        if state.len() != self.input_size() {
            return Err(BanditError::dimension_mismatch(
                format!("state of length {}", self.input_size()),
                format!("{}", state.len()),
            ));
        }
        let output = self.forward_batch(state.insert_axis(Axis(0)))?;
        let values = output.index_axis_move(Axis(0), 0);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BanditError::NumericalError("non-finite value estimate".to_string()));
        }
        Ok(values)
    }

    fn fit(&mut self, state: ArrayView1<f32>, target: ArrayView1<f32>, loss: &dyn Loss) -> Result<f32> {
        if state.len() != self.input_size() {
            return Err(BanditError::dimension_mismatch(
                format!("state of length {}", self.input_size()),
                format!("{}", state.len()),
            ));
        }
        self.train_batch(state.insert_axis(Axis(0)), target.insert_axis(Axis(0)), loss)
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized).at_path(path)
    }

    fn load_weights(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path).at_path(path)?;
        let mut loaded: NeuralNetwork = bincode::deserialize(&data).at_path(path)?;
        if loaded.shapes() != self.shapes() {
            return Err(BanditError::dimension_mismatch(
                format!("layer shapes {:?}", self.shapes()),
                format!("{:?}", loaded.shapes()),
            ));
        }
        loaded.learning_rate = self.learning_rate;
        *self = loaded;
        Ok(())
    }
}
