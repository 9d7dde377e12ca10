//! Training hyperparameters, their validation, and default resolution.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArborError;

/// Decision-tree splitting criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impurity {
    Gini,
    Entropy,
}

impl Impurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impurity::Gini => "gini",
            Impurity::Entropy => "entropy",
        }
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impurity {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gini" => Ok(Impurity::Gini),
            "entropy" => Ok(Impurity::Entropy),
            other => Err(ArborError::InvalidParameter {
                name: "impurity",
                reason: format!("'{}' is not one of: gini, entropy", other),
            }),
        }
    }
}

/// Feature-subset policy: how many features each tree split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSubset {
    Auto,
    All,
    Sqrt,
    Log2,
    OneThird,
}

impl FeatureSubset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSubset::Auto => "auto",
            FeatureSubset::All => "all",
            FeatureSubset::Sqrt => "sqrt",
            FeatureSubset::Log2 => "log2",
            FeatureSubset::OneThird => "onethird",
        }
    }
}

impl fmt::Display for FeatureSubset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureSubset {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(FeatureSubset::Auto),
            "all" => Ok(FeatureSubset::All),
            "sqrt" => Ok(FeatureSubset::Sqrt),
            "log2" => Ok(FeatureSubset::Log2),
            "onethird" => Ok(FeatureSubset::OneThird),
            other => Err(ArborError::InvalidParameter {
                name: "feature_subset",
                reason: format!("'{}' is not one of: auto, all, sqrt, log2, onethird", other),
            }),
        }
    }
}

/// The full hyperparameter set for random-forest training.
///
/// Immutable once a model is trained; this struct is exactly the payload
/// persisted in the model metadata record. Optional fields left unset are
/// persisted as absent, never as zero/empty stand-ins.
///
/// # Defaults
///
/// | Parameter                   | Default  |
/// |-----------------------------|----------|
/// | `num_classes`               | 2        |
/// | `num_trees`                 | 1        |
/// | `impurity`                  | `Gini`   |
/// | `max_depth`                 | 4        |
/// | `max_bins`                  | 100      |
/// | `seed`                      | random   |
/// | `categorical_features_info` | unset    |
/// | `feature_subset`            | unset    |
/// | `min_instances_per_node`    | unset    |
/// | `sub_sampling_rate`         | unset    |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub label_column: String,
    pub observation_columns: Vec<String>,
    pub num_classes: u32,
    pub num_trees: u32,
    pub impurity: Impurity,
    pub max_depth: u32,
    pub max_bins: u32,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical_features_info: Option<HashMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_subset: Option<FeatureSubset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances_per_node: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_sampling_rate: Option<f64>,
}

impl TrainConfig {
    pub fn new(label_column: impl Into<String>, observation_columns: Vec<String>) -> Self {
        Self {
            label_column: label_column.into(),
            observation_columns,
            num_classes: 2,
            num_trees: 1,
            impurity: Impurity::Gini,
            max_depth: 4,
            max_bins: 100,
            seed: rand::random(),
            categorical_features_info: None,
            feature_subset: None,
            min_instances_per_node: None,
            sub_sampling_rate: None,
        }
    }

    #[must_use]
    pub fn with_num_classes(mut self, num_classes: u32) -> Self {
        self.num_classes = num_classes;
        self
    }

    #[must_use]
    pub fn with_num_trees(mut self, num_trees: u32) -> Self {
        self.num_trees = num_trees;
        self
    }

    #[must_use]
    pub fn with_impurity(mut self, impurity: Impurity) -> Self {
        self.impurity = impurity;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_bins(mut self, max_bins: u32) -> Self {
        self.max_bins = max_bins;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_categorical_features_info(mut self, info: HashMap<String, u32>) -> Self {
        self.categorical_features_info = Some(info);
        self
    }

    #[must_use]
    pub fn with_feature_subset(mut self, subset: FeatureSubset) -> Self {
        self.feature_subset = Some(subset);
        self
    }

    #[must_use]
    pub fn with_min_instances_per_node(mut self, min: u32) -> Self {
        self.min_instances_per_node = Some(min);
        self
    }

    #[must_use]
    pub fn with_sub_sampling_rate(mut self, rate: f64) -> Self {
        self.sub_sampling_rate = Some(rate);
        self
    }

    /// Fail-fast precondition checks, run before any expensive work.
    ///
    /// Uses input values only; performs no I/O. The first violation aborts
    /// with a validation error naming the offending parameter.
    pub fn validate(&self) -> Result<(), ArborError> {
        if self.label_column.is_empty() {
            return Err(ArborError::InvalidParameter {
                name: "label_column",
                reason: "must not be empty".to_string(),
            });
        }
        if self.observation_columns.is_empty() {
            return Err(ArborError::InvalidParameter {
                name: "observation_columns",
                reason: "must not be empty".to_string(),
            });
        }
        if self.num_trees == 0 {
            return Err(ArborError::InvalidParameter {
                name: "num_trees",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.num_classes < 2 {
            return Err(ArborError::InvalidParameter {
                name: "num_classes",
                reason: format!("must be at least 2, got {}", self.num_classes),
            });
        }
        if let Some(min) = self.min_instances_per_node {
            if min == 0 {
                return Err(ArborError::InvalidParameter {
                    name: "min_instances_per_node",
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(rate) = self.sub_sampling_rate {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(ArborError::InvalidParameter {
                    name: "sub_sampling_rate",
                    reason: format!("must be in (0, 1], got {}", rate),
                });
            }
        }
        Ok(())
    }
}

/// Resolve the feature-subset policy once, before training.
///
/// Unset defaults to `All`. `Auto` resolves to `All` for a single tree and
/// `Sqrt` otherwise. Explicit values pass through unchanged.
pub fn resolve_feature_subset(subset: Option<FeatureSubset>, num_trees: u32) -> FeatureSubset {
    match subset {
        None => FeatureSubset::All,
        Some(FeatureSubset::Auto) => {
            if num_trees == 1 {
                FeatureSubset::All
            } else {
                FeatureSubset::Sqrt
            }
        }
        Some(explicit) => explicit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> TrainConfig {
        TrainConfig::new("label", vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn empty_label_column_rejected() {
        let cfg = TrainConfig::new("", vec!["a".to_string()]);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            ArborError::InvalidParameter { name: "label_column", .. }
        ));
    }

    #[test]
    fn empty_observation_columns_rejected() {
        let cfg = TrainConfig::new("label", vec![]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(base_config().with_num_trees(0).validate().is_err());
    }

    #[test]
    fn one_class_rejected() {
        assert!(base_config().with_num_classes(1).validate().is_err());
    }

    #[test]
    fn zero_min_instances_rejected() {
        assert!(base_config().with_min_instances_per_node(0).validate().is_err());
    }

    #[test]
    fn out_of_range_sub_sampling_rejected() {
        assert!(base_config().with_sub_sampling_rate(1.5).validate().is_err());
        assert!(base_config().with_sub_sampling_rate(0.0).validate().is_err());
        assert!(base_config().with_sub_sampling_rate(1.0).validate().is_ok());
    }

    #[test]
    fn impurity_parsing() {
        assert_eq!("gini".parse::<Impurity>().unwrap(), Impurity::Gini);
        assert_eq!("Entropy".parse::<Impurity>().unwrap(), Impurity::Entropy);
        assert!("foo".parse::<Impurity>().is_err());
    }

    #[test]
    fn feature_subset_resolution() {
        assert_eq!(resolve_feature_subset(None, 5), FeatureSubset::All);
        assert_eq!(
            resolve_feature_subset(Some(FeatureSubset::Auto), 1),
            FeatureSubset::All
        );
        assert_eq!(
            resolve_feature_subset(Some(FeatureSubset::Auto), 5),
            FeatureSubset::Sqrt
        );
        assert_eq!(
            resolve_feature_subset(Some(FeatureSubset::Log2), 5),
            FeatureSubset::Log2
        );
    }
}
