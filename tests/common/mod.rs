//! Deterministic stand-in engine shared by the orchestration tests.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use arbor_classifiers::config::{FeatureSubset, TrainConfig};
use arbor_classifiers::engine::{ForestEngine, ForestModel};
use arbor_classifiers::error::ArborError;
use arbor_classifiers::frame::{ColumnDescriptor, DataType, Frame, Value};
use arbor_classifiers::math::Array2;

/// Canned model: always predicts the majority training label.
pub struct StubModel {
    pub class: f64,
    pub importances: Vec<f64>,
}

impl ForestModel for StubModel {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, ArborError> {
        Ok(vec![self.class; features.nrows()])
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    fn save(&self, path: &Path) -> Result<(), ArborError> {
        let json = serde_json::to_string(&(self.class, &self.importances))?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Stand-in engine with call counting, so tests can assert the engine is
/// never touched on early-failure paths.
#[derive(Default)]
pub struct StubEngine {
    pub fit_calls: Cell<usize>,
    pub load_calls: Cell<usize>,
}

impl ForestEngine for StubEngine {
    fn fit(
        &self,
        _config: &TrainConfig,
        _subset: FeatureSubset,
        features: &Array2<f64>,
        labels: &[f64],
    ) -> Result<Box<dyn ForestModel>, ArborError> {
        self.fit_calls.set(self.fit_calls.get() + 1);

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &l in labels {
            *counts.entry(l as i64).or_default() += 1;
        }
        let class = counts
            .into_iter()
            .max_by_key(|&(label, n)| (n, label))
            .map(|(l, _)| l as f64)
            .unwrap_or(0.0);

        // deterministic ramp, normalized to sum to 1
        let n = features.ncols();
        let mut importances: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let total: f64 = importances.iter().sum();
        for v in importances.iter_mut() {
            *v /= total;
        }

        Ok(Box::new(StubModel { class, importances }))
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ForestModel>, ArborError> {
        self.load_calls.set(self.load_calls.get() + 1);
        let json = fs::read_to_string(path)?;
        let (class, importances): (f64, Vec<f64>) = serde_json::from_str(&json)?;
        Ok(Box::new(StubModel { class, importances }))
    }
}

/// Small labeled frame: two numeric observation columns plus a 0/1 label.
pub fn labeled_frame() -> Frame {
    Frame::new(
        vec![
            ColumnDescriptor::new("x1", DataType::Float64),
            ColumnDescriptor::new("x2", DataType::Float64),
            ColumnDescriptor::new("label", DataType::Int64),
        ],
        vec![
            vec![Value::Float64(0.2), Value::Float64(0.8), Value::Int64(1)],
            vec![Value::Float64(0.1), Value::Float64(0.9), Value::Int64(1)],
            vec![Value::Float64(0.3), Value::Float64(0.7), Value::Int64(1)],
            vec![Value::Float64(0.9), Value::Float64(0.1), Value::Int64(0)],
            vec![Value::Float64(0.8), Value::Float64(0.2), Value::Int64(0)],
        ],
    )
    .unwrap()
}

pub fn observation_columns() -> Vec<String> {
    vec!["x1".to_string(), "x2".to_string()]
}
