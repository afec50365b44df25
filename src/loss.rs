use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Trait defining the interface for training objectives
///
/// Targets and predictions must have the same shape. Implementations panic
/// otherwise rather than broadcasting; callers such as
/// [`NeuralNetwork::train_batch`](crate::model::NeuralNetwork::train_batch)
/// check shapes first and return [`BanditError::DimensionMismatch`](crate::error::BanditError).
pub trait Loss: Send + Sync {
    /// Compute the loss for a single target and prediction
    fn compute(&self, target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> f32;

    /// Mean loss over a batch of rows
    fn compute_batch(&self, targets: ArrayView2<f32>, predictions: ArrayView2<f32>) -> f32;

    /// Gradient of the loss with respect to the prediction
    fn gradient(&self, target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> Array1<f32>;

    /// Gradient for a batch, averaged over the rows
    fn gradient_batch(&self, targets: ArrayView2<f32>, predictions: ArrayView2<f32>) -> Array2<f32>;
}

/// Pseudo-Huber loss: `mean(sqrt(1 + (prediction - target)^2) - 1)` over the last axis.
///
/// Quadratic for small errors and linear for large ones, so a single
/// anomalous reward (one very slow benchmark run) cannot blow up the
/// gradient the way squared error would.
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoHuber;

impl PseudoHuber {
    #[inline]
    fn transform(error: f32) -> f32 {
        (1.0 + error * error).sqrt() - 1.0
    }

    #[inline]
    fn derivative(error: f32) -> f32 {
        error / (1.0 + error * error).sqrt()
    }

    fn error_vector(target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> Array1<f32> {
        assert_eq!(
            target.len(),
            prediction.len(),
            "pseudo-Huber loss needs target and prediction of equal length"
        );
        &prediction - &target
    }

    fn check_batch_shape(targets: ArrayView2<f32>, predictions: ArrayView2<f32>) {
        assert_eq!(
            targets.dim(),
            predictions.dim(),
            "pseudo-Huber loss needs targets and predictions of equal shape"
        );
    }

    fn error_matrix(targets: ArrayView2<f32>, predictions: ArrayView2<f32>) -> Array2<f32> {
        Self::check_batch_shape(targets, predictions);
        &predictions - &targets
    }
}

impl Loss for PseudoHuber {
    fn compute(&self, target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> f32 {
        let error = Self::error_vector(target, prediction);
        if error.is_empty() {
            return 0.0;
        }
        error.mapv(Self::transform).sum() / error.len() as f32
    }

    fn compute_batch(&self, targets: ArrayView2<f32>, predictions: ArrayView2<f32>) -> f32 {
        Self::check_batch_shape(targets, predictions);
        let rows = predictions.nrows();
        if rows == 0 {
            return 0.0;
        }
        predictions
            .axis_iter(Axis(0))
            .zip(targets.axis_iter(Axis(0)))
            .map(|(p, t)| self.compute(t, p))
            .sum::<f32>()
            / rows as f32
    }

    fn gradient(&self, target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> Array1<f32> {
        let n = prediction.len().max(1) as f32;
        Self::error_vector(target, prediction).mapv(|e| Self::derivative(e) / n)
    }

    fn gradient_batch(&self, targets: ArrayView2<f32>, predictions: ArrayView2<f32>) -> Array2<f32> {
        let scale = (predictions.nrows().max(1) * predictions.ncols().max(1)) as f32;
        Self::error_matrix(targets, predictions).mapv(|e| Self::derivative(e) / scale)
    }
}

/// Pseudo-Huber loss of one `(target, prediction)` pair.
///
/// # Panics
///
/// If `target` and `prediction` differ in length.
pub fn pseudo_huber_loss(target: ArrayView1<f32>, prediction: ArrayView1<f32>) -> f32 {
    PseudoHuber.compute(target, prediction)
}
