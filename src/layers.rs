use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{BanditError, Result};

/// A fully connected (dense) layer of the value network.
///
/// The layer caches its last inputs and pre-activations so that a call to
/// [`DenseLayer::backward_batch`] can follow a call to
/// [`DenseLayer::forward_batch`]. The caches are not persisted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a layer with Glorot-uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (input_size + output_size) as f32).sqrt();
        let weights = Array2::random_using((input_size, output_size), Uniform::new(-limit, limit), rng);
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(BanditError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.dim() != self.biases.dim() {
            return Err(BanditError::dimension_mismatch(
                format!("{}", self.biases.len()),
                format!("{}", biases.len()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Forward pass for a batch of row vectors.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(BanditError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.ncols()),
            ));
        }
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        Ok(outputs)
    }

    /// Backward pass for a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`, where the
    /// adjusted error is the output error scaled by the activation derivative.
    pub fn backward_batch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let (pre_activation_output, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => {
                return Err(BanditError::invalid_parameter(
                    "layer",
                    "forward_batch() must be called before backward_batch()",
                ))
            }
        };

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Ok((adjusted_error, weight_gradients, bias_gradients))
    }
}
