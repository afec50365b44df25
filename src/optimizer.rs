use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::layers::DenseLayer;

/// Applies one gradient step to a layer's parameters.
///
/// `layer_index` identifies the layer so stateful optimizers can keep
/// per-layer moment estimates.
pub trait Optimizer {
    fn update_weights(&mut self, layer_index: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer_index: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Marks the end of one full update of every layer.
    fn step(&mut self) {}
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer_index: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.update_weights(layer_index, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer_index, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer_index: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.update_biases(layer_index, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer_index, biases, gradients, learning_rate),
        }
    }

    fn step(&mut self) {
        match self {
            OptimizerWrapper::Sgd(optimizer) => optimizer.step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Sgd;

impl Sgd {
    pub fn new() -> Sgd {
        Sgd
    }
}

impl Optimizer for Sgd {
    fn update_weights(&mut self, _layer_index: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer_index: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with first and second moment estimates kept per layer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    /// Number of completed steps, starting at 1 for bias correction.
    pub t: i32,
}

impl Adam {
    pub fn new(layers: &[DenseLayer], beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            v_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            m_biases: layers.iter().map(|l| Array1::zeros(l.biases.dim())).collect(),
            v_biases: layers.iter().map(|l| Array1::zeros(l.biases.dim())).collect(),
            t: 1,
        }
    }

    /// Keras defaults: beta1 0.9, beta2 0.999, epsilon 1e-7.
    pub fn default_for(layers: &[DenseLayer]) -> Self {
        Self::new(layers, 0.9, 0.999, 1e-7)
    }

    fn corrections(&self) -> (f32, f32) {
        (1.0 - self.beta1.powi(self.t), 1.0 - self.beta2.powi(self.t))
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer_index: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (c1, c2) = self.corrections();
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let m = &mut self.m_weights[layer_index];
        let v = &mut self.v_weights[layer_index];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(weights)
            .and(&*m)
            .and(&*v)
            .for_each(|w, &m, &v| *w -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn update_biases(&mut self, layer_index: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (c1, c2) = self.corrections();
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let m = &mut self.m_biases[layer_index];
        let v = &mut self.v_biases[layer_index];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(biases)
            .and(&*m)
            .and(&*v)
            .for_each(|b, &m, &v| *b -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn step(&mut self) {
        self.t = self.t.saturating_add(1);
    }
}
