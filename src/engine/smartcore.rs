//! Production engine adapter backed by `smartcore`'s random forest.
//!
//! `max_bins`, `categorical_features_info`, and `sub_sampling_rate` have no
//! smartcore equivalent; they are validated and persisted upstream and logged
//! here as unmapped hints. Feature importances are computed at fit time by
//! permuting one feature column at a time over the training data (seeded, so
//! deterministic for a fixed config) and stored inside the native artifact.

use std::fs;
use std::path::Path;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;

use crate::config::{FeatureSubset, Impurity, TrainConfig};
use crate::engine::{ForestEngine, ForestModel};
use crate::error::ArborError;
use crate::math::Array2;

type Forest = RandomForestClassifier<f64, i64, DenseMatrix<f64>, Vec<i64>>;

/// Stateless engine handle; all state lives in the fitted artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmartcoreForest;

/// Native artifact: the fitted forest plus training-time importances.
#[derive(Serialize, Deserialize)]
struct ForestArtifact {
    n_features: usize,
    importances: Vec<f64>,
    forest: Forest,
}

struct FittedForest {
    artifact: ForestArtifact,
}

/// Per-split feature count for a resolved subset policy.
fn features_per_split(subset: FeatureSubset, n_features: usize) -> usize {
    let n = n_features.max(1);
    let m = match subset {
        // Auto never reaches the engine; treat it as All if it does.
        FeatureSubset::All | FeatureSubset::Auto => n,
        FeatureSubset::Sqrt => (n as f64).sqrt().ceil() as usize,
        FeatureSubset::Log2 => (n as f64).log2().ceil() as usize,
        FeatureSubset::OneThird => (n as f64 / 3.0).ceil() as usize,
    };
    m.clamp(1, n)
}

fn class_index(label: f64, row: usize) -> Result<i64, ArborError> {
    if !label.is_finite() || label.fract() != 0.0 {
        return Err(ArborError::Training(format!(
            "label {} at row {} is not an integral class index",
            label, row
        )));
    }
    Ok(label as i64)
}

fn accuracy(forest: &Forest, rows: &Vec<Vec<f64>>, y: &[i64]) -> Result<f64, ArborError> {
    if rows.is_empty() {
        return Ok(0.0);
    }
    let x = DenseMatrix::from_2d_vec(rows);
    let preds = forest
        .predict(&x)
        .map_err(|e| ArborError::Training(e.to_string()))?;
    let correct = preds.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / y.len() as f64)
}

/// Mean-accuracy-drop importances over the training data, normalized to sum
/// to 1 when any feature matters at all.
fn permutation_importances(
    forest: &Forest,
    rows: &Vec<Vec<f64>>,
    y: &[i64],
    seed: u64,
) -> Result<Vec<f64>, ArborError> {
    let n_features = rows.first().map_or(0, |r| r.len());
    let baseline = accuracy(forest, rows, y)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut drops = Vec::with_capacity(n_features);
    for feature in 0..n_features {
        let mut permuted: Vec<f64> = rows.iter().map(|r| r[feature]).collect();
        permuted.shuffle(&mut rng);

        let mut shuffled_rows = rows.clone();
        for (row, v) in shuffled_rows.iter_mut().zip(&permuted) {
            row[feature] = *v;
        }
        let acc = accuracy(forest, &shuffled_rows, y)?;
        drops.push((baseline - acc).max(0.0));
    }

    let total: f64 = drops.iter().sum();
    if total > 0.0 {
        for d in drops.iter_mut() {
            *d /= total;
        }
    }
    Ok(drops)
}

impl ForestEngine for SmartcoreForest {
    fn fit(
        &self,
        config: &TrainConfig,
        feature_subset: FeatureSubset,
        features: &Array2<f64>,
        labels: &[f64],
    ) -> Result<Box<dyn ForestModel>, ArborError> {
        if features.nrows() == 0 {
            return Err(ArborError::Training("training frame has no rows".to_string()));
        }
        if labels.len() != features.nrows() {
            return Err(ArborError::Training(format!(
                "{} labels for {} feature rows",
                labels.len(),
                features.nrows()
            )));
        }

        let rows = features.to_rows();
        let x = DenseMatrix::from_2d_vec(&rows);
        let y = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| class_index(l, i))
            .collect::<Result<Vec<i64>, _>>()?;

        // smartcore tree counts and depths are u16; reject rather than truncate
        let n_trees = u16::try_from(config.num_trees).map_err(|_| {
            ArborError::Training(format!(
                "num_trees {} exceeds the engine maximum {}",
                config.num_trees,
                u16::MAX
            ))
        })?;
        let max_depth = u16::try_from(config.max_depth).map_err(|_| {
            ArborError::Training(format!(
                "max_depth {} exceeds the engine maximum {}",
                config.max_depth,
                u16::MAX
            ))
        })?;

        let m = features_per_split(feature_subset, features.ncols());
        let mut params = RandomForestClassifierParameters::default()
            .with_criterion(match config.impurity {
                Impurity::Gini => SplitCriterion::Gini,
                Impurity::Entropy => SplitCriterion::Entropy,
            })
            .with_n_trees(n_trees)
            .with_max_depth(max_depth)
            .with_seed(config.seed)
            .with_m(m);
        if let Some(min) = config.min_instances_per_node {
            params = params.with_min_samples_leaf(min as usize);
        }

        if config.categorical_features_info.is_some() {
            debug!("categorical_features_info has no smartcore equivalent; hint ignored");
        }
        if let Some(rate) = config.sub_sampling_rate {
            if rate < 1.0 {
                debug!("sub_sampling_rate {} has no smartcore equivalent; hint ignored", rate);
            }
        }
        debug!(
            "fitting forest: rows={}, features={}, trees={}, m={}, impurity={}, max_bins hint={}",
            features.nrows(),
            features.ncols(),
            config.num_trees,
            m,
            config.impurity,
            config.max_bins
        );

        let forest: Forest = RandomForestClassifier::fit(&x, &y, params)
            .map_err(|e| ArborError::Training(e.to_string()))?;
        let importances = permutation_importances(&forest, &rows, &y, config.seed)?;

        Ok(Box::new(FittedForest {
            artifact: ForestArtifact {
                n_features: features.ncols(),
                importances,
                forest,
            },
        }))
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ForestModel>, ArborError> {
        let bytes = fs::read(path)?;
        let artifact: ForestArtifact =
            bincode::deserialize(&bytes).map_err(|e| ArborError::Artifact(e.to_string()))?;
        debug!(
            "loaded forest artifact from {} ({} features)",
            path.display(),
            artifact.n_features
        );
        Ok(Box::new(FittedForest { artifact }))
    }
}

impl ForestModel for FittedForest {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, ArborError> {
        if features.ncols() != self.artifact.n_features {
            return Err(ArborError::Inference(format!(
                "input has {} features, model was trained on {}",
                features.ncols(),
                self.artifact.n_features
            )));
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        let rows = features.to_rows();
        let x = DenseMatrix::from_2d_vec(&rows);
        let preds = self
            .artifact
            .forest
            .predict(&x)
            .map_err(|e| ArborError::Inference(e.to_string()))?;
        Ok(preds.into_iter().map(|p| p as f64).collect())
    }

    fn feature_importances(&self) -> &[f64] {
        &self.artifact.importances
    }

    fn save(&self, path: &Path) -> Result<(), ArborError> {
        let bytes =
            bincode::serialize(&self.artifact).map_err(|e| ArborError::Artifact(e.to_string()))?;
        fs::write(path, &bytes)?;
        debug!("saved forest artifact to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}
