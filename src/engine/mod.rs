//! Narrow capability seam over the external forest library.
//!
//! The orchestration layer only ever talks to `ForestEngine`/`ForestModel`,
//! so it can be exercised with a stand-in engine returning canned outputs.
//! The production implementation lives in [`smartcore`](self::smartcore).

use std::path::Path;

use crate::config::{FeatureSubset, TrainConfig};
use crate::error::ArborError;
use crate::math::Array2;

pub mod smartcore;

/// A trained, opaque forest artifact.
///
/// Implementations own whatever the backing library returned from fit plus
/// the per-feature importance scores computed at training time (index-aligned
/// with the training feature order).
pub trait ForestModel {
    /// Predicted class index per row, as f64.
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, ArborError>;

    /// Importance score per feature, in training feature order.
    fn feature_importances(&self) -> &[f64];

    /// Persist the native artifact at `path`.
    fn save(&self, path: &Path) -> Result<(), ArborError>;
}

impl std::fmt::Debug for dyn ForestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForestModel").finish_non_exhaustive()
    }
}

/// Trainer/loader for forest artifacts.
///
/// Calls are synchronous and blocking; any failure from the backing library
/// propagates unmodified, with no retry and no partial model.
pub trait ForestEngine {
    /// Train a forest. `feature_subset` arrives already resolved (never
    /// `Auto`); `labels` are class indices in `[0, num_classes)`.
    fn fit(
        &self,
        config: &TrainConfig,
        feature_subset: FeatureSubset,
        features: &Array2<f64>,
        labels: &[f64],
    ) -> Result<Box<dyn ForestModel>, ArborError>;

    /// Reload a native artifact previously written by [`ForestModel::save`].
    fn load(&self, path: &Path) -> Result<Box<dyn ForestModel>, ArborError>;
}
