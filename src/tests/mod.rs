pub mod test_config;
pub mod test_policy;

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use ndarray::{Array1, ArrayView1};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};
use crate::loss::Loss;
use crate::model::ValueModel;
use crate::telemetry::TelemetrySink;

/// Approximator with fixed, known value estimates that records how it is used.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableModel {
    pub state_size: usize,
    pub values: Vec<f32>,
    #[serde(skip)]
    pub predict_calls: usize,
    #[serde(skip)]
    pub fit_targets: Vec<Vec<f32>>,
}

impl TableModel {
    pub fn with_values(&mut self, values: &[f32]) {
        self.values = values.to_vec();
    }
}

impl ValueModel for TableModel {
    fn build(state_size: usize, action_size: usize, _learning_rate: f32, _rng: &mut dyn RngCore) -> Result<Self> {
        Ok(TableModel {
            state_size,
            values: (0..action_size).map(|a| a as f32 + 1.0).collect(),
            predict_calls: 0,
            fit_targets: Vec::new(),
        })
    }

    fn predict(&mut self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        if state.len() != self.state_size {
            return Err(BanditError::dimension_mismatch(
                format!("{}", self.state_size),
                format!("{}", state.len()),
            ));
        }
        self.predict_calls += 1;
        Ok(Array1::from(self.values.clone()))
    }

    fn fit(&mut self, _state: ArrayView1<f32>, target: ArrayView1<f32>, loss: &dyn Loss) -> Result<f32> {
        let current = Array1::from(self.values.clone());
        self.fit_targets.push(target.to_vec());
        Ok(loss.compute(target, current.view()))
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    fn load_weights(&mut self, path: &Path) -> Result<()> {
        let loaded: TableModel = serde_json::from_slice(&fs::read(path)?)?;
        self.values = loaded.values;
        Ok(())
    }
}

pub type Recorded = Rc<RefCell<Vec<(String, f32, u64)>>>;

/// Sink that keeps every data point in memory.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub points: Recorded,
    pub flushes: Rc<RefCell<usize>>,
}

impl TelemetrySink for RecordingSink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) -> Result<()> {
        self.points.borrow_mut().push((tag.to_string(), value, step));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        *self.flushes.borrow_mut() += 1;
        Ok(())
    }
}
