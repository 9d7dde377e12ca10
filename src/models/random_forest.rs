//! Random-forest classifier wrapper: parameter validation, training
//! orchestration, prediction, test metrics, and persistence plumbing.
//!
//! The wrapper is immutable once trained, so concurrent reads
//! (predict/test/score/save) are safe by construction. Heavy lifting is
//! delegated to the [`ForestEngine`] the caller supplies.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::{resolve_feature_subset, TrainConfig};
use crate::engine::{ForestEngine, ForestModel};
use crate::error::ArborError;
use crate::frame::{ColumnDescriptor, DataType, Frame, Value};
use crate::math::Array2;
use crate::metadata::{MetadataRecord, METADATA_FILE, MODEL_FILE};
use crate::metrics::{classification_metrics, ClassificationMetrics};

/// Name of the prediction column appended by [`RandomForestClassifierModel::predict`].
pub const PREDICTED_CLASS_COLUMN: &str = "predicted_class";

/// Adapter identifier written into exported archives so a scoring-service
/// loader can pick the right reader.
pub const ADAPTER_ID: &str = "arbor_classifiers/random_forest";

const ADAPTER_FILE: &str = "adapter.txt";

/// One named, typed field in the scoring-service schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub data_type: DataType,
}

/// Static descriptive metadata for scoring-service introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringMetadata {
    pub model_type: &'static str,
    pub adapter: &'static str,
}

/// A trained random-forest classification model plus the hyperparameter set
/// that produced it.
pub struct RandomForestClassifierModel {
    config: TrainConfig,
    model: Box<dyn ForestModel>,
}

// The boxed engine model is opaque, so derive(Debug) is not an option.
impl fmt::Debug for RandomForestClassifierModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForestClassifierModel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RandomForestClassifierModel {
    /// Train a model on `frame`.
    ///
    /// Validates the config (fail-fast, before any engine work), resolves the
    /// feature-subset policy once, assembles the feature matrix in
    /// `observation_columns` order, and delegates fitting to `engine`. The
    /// column order used here is stored and reused verbatim by every later
    /// predict/test/score/feature-importances call.
    pub fn train(
        engine: &dyn ForestEngine,
        frame: &Frame,
        config: TrainConfig,
    ) -> Result<Self, ArborError> {
        config.validate()?;
        let subset = resolve_feature_subset(config.feature_subset, config.num_trees);

        let x = frame.feature_matrix(&config.observation_columns)?;
        let y = frame.numeric_column(&config.label_column)?;
        let model = engine.fit(&config, subset, &x, &y)?;

        info!(
            "trained random forest: {} trees, {} features, {} rows, subset={}",
            config.num_trees,
            config.observation_columns.len(),
            frame.row_count(),
            subset
        );
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Predict a class per row and return the input frame with one appended
    /// `predicted_class` column.
    ///
    /// `columns`, when given, must have the same length as the training
    /// observation columns and is interpreted in the same positional order;
    /// it defaults to the training columns.
    pub fn predict(&self, frame: &Frame, columns: Option<&[String]>) -> Result<Frame, ArborError> {
        let columns = self.resolve_columns(columns)?;
        let x = frame.feature_matrix(columns)?;
        let preds = self.model.predict(&x)?;
        frame.with_column(
            ColumnDescriptor::new(PREDICTED_CLASS_COLUMN, DataType::Float64),
            preds.into_iter().map(Value::Float64).collect(),
        )
    }

    /// Score `frame` against its true labels and compute classification
    /// metrics — binary when `num_classes == 2` (positive class `1.0`),
    /// multiclass otherwise. Same column-arity contract as [`Self::predict`].
    pub fn test(
        &self,
        frame: &Frame,
        columns: Option<&[String]>,
    ) -> Result<ClassificationMetrics, ArborError> {
        let columns = self.resolve_columns(columns)?;
        let x = frame.feature_matrix(columns)?;
        let scores = self.model.predict(&x)?;
        let labels = frame.numeric_column(&self.config.label_column)?;
        classification_metrics(&scores, &labels, self.config.num_classes)
    }

    /// Observation-column names paired with the model's importance scores,
    /// in training order. The pairing relies on that stored order matching
    /// the engine's internal feature order exactly.
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        self.config
            .observation_columns
            .iter()
            .cloned()
            .zip(self.model.feature_importances().iter().copied())
            .collect()
    }

    /// Persist the model under directory `path`: the engine's native
    /// artifact plus the versioned metadata record.
    pub fn save(&self, path: &Path) -> Result<(), ArborError> {
        fs::create_dir_all(path)?;
        self.model.save(&path.join(MODEL_FILE))?;
        MetadataRecord::new(self.config.clone()).save(&path.join(METADATA_FILE))?;
        info!("saved model to {}", path.display());
        Ok(())
    }

    /// Reload a model saved by [`Self::save`].
    ///
    /// The metadata record is read and version-checked first; an unsupported
    /// version fails before the engine is asked to load anything.
    pub fn load(engine: &dyn ForestEngine, path: &Path) -> Result<Self, ArborError> {
        let record = MetadataRecord::load(&path.join(METADATA_FILE))?;
        let model = engine.load(&path.join(MODEL_FILE))?;
        info!("loaded model from {}", path.display());
        Ok(Self {
            config: record.config,
            model,
        })
    }

    /// Export a single deployable zip archive at `archive` containing the
    /// native artifact, the metadata record, and the adapter identifier.
    ///
    /// Staging uses a scoped temporary directory that is removed when this
    /// call returns, on success or failure.
    pub fn export_to_archive(&self, archive: &Path) -> Result<(), ArborError> {
        let staging = tempfile::tempdir()?;
        self.save(staging.path())?;

        let file = fs::File::create(archive)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for name in [MODEL_FILE, METADATA_FILE] {
            zip.start_file(name, options)
                .map_err(|e| ArborError::Artifact(e.to_string()))?;
            let bytes = fs::read(staging.path().join(name))?;
            zip.write_all(&bytes)?;
        }
        zip.start_file(ADAPTER_FILE, options)
            .map_err(|e| ArborError::Artifact(e.to_string()))?;
        zip.write_all(ADAPTER_ID.as_bytes())?;
        zip.finish().map_err(|e| ArborError::Artifact(e.to_string()))?;

        staging.close()?;
        info!("exported model archive to {}", archive.display());
        Ok(())
    }

    /// Single-row inference for a scoring service: coerce every input value
    /// to f64, predict, and return the input values with the predicted class
    /// appended.
    pub fn score(&self, row: &[Value]) -> Result<Vec<Value>, ArborError> {
        if row.is_empty() {
            return Err(ArborError::ScoringInput("input row is empty".to_string()));
        }
        let expected = self.config.observation_columns.len();
        if row.len() != expected {
            return Err(ArborError::ScoringInput(format!(
                "expected {} feature values, got {}",
                expected,
                row.len()
            )));
        }
        let features = row
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64().ok_or_else(|| {
                    ArborError::ScoringInput(format!(
                        "value {:?} at position {} is not numeric-coercible",
                        v, i
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let x = Array2::from_shape_vec((1, expected), features)
            .map_err(|e| ArborError::ScoringInput(e.to_string()))?;
        let pred = self
            .model
            .predict(&x)?
            .first()
            .copied()
            .ok_or_else(|| ArborError::Inference("engine returned no prediction".to_string()))?;

        let mut out = row.to_vec();
        out.push(Value::Float64(pred));
        Ok(out)
    }

    /// Scoring-service input schema: one float field per observation column.
    pub fn input(&self) -> Vec<FieldSchema> {
        self.config
            .observation_columns
            .iter()
            .map(|c| FieldSchema {
                name: c.clone(),
                data_type: DataType::Float64,
            })
            .collect()
    }

    /// Scoring-service output schema: the input fields plus the prediction.
    pub fn output(&self) -> Vec<FieldSchema> {
        let mut fields = self.input();
        fields.push(FieldSchema {
            name: "PredictedClass".to_string(),
            data_type: DataType::Float64,
        });
        fields
    }

    pub fn scoring_metadata(&self) -> ScoringMetadata {
        ScoringMetadata {
            model_type: "Random Forest Classifier Model",
            adapter: ADAPTER_ID,
        }
    }

    fn resolve_columns<'a>(
        &'a self,
        columns: Option<&'a [String]>,
    ) -> Result<&'a [String], ArborError> {
        match columns {
            None => Ok(&self.config.observation_columns),
            Some(cols) => {
                if cols.len() != self.config.observation_columns.len() {
                    return Err(ArborError::ColumnCountMismatch {
                        expected: self.config.observation_columns.len(),
                        got: cols.len(),
                    });
                }
                Ok(cols)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureSubset;

    /// Canned engine: predicts the majority training label for every row.
    struct MajorityModel {
        class: f64,
        importances: Vec<f64>,
    }

    impl ForestModel for MajorityModel {
        fn predict(&self, features: &Array2<f64>) -> Result<Vec<f64>, ArborError> {
            Ok(vec![self.class; features.nrows()])
        }

        fn feature_importances(&self) -> &[f64] {
            &self.importances
        }

        fn save(&self, path: &Path) -> Result<(), ArborError> {
            fs::write(path, self.class.to_le_bytes())?;
            Ok(())
        }
    }

    struct MajorityEngine;

    impl ForestEngine for MajorityEngine {
        fn fit(
            &self,
            _config: &TrainConfig,
            _subset: FeatureSubset,
            features: &Array2<f64>,
            labels: &[f64],
        ) -> Result<Box<dyn ForestModel>, ArborError> {
            let ones = labels.iter().filter(|&&l| l == 1.0).count();
            let class = if ones * 2 >= labels.len() { 1.0 } else { 0.0 };
            Ok(Box::new(MajorityModel {
                class,
                importances: vec![1.0 / features.ncols() as f64; features.ncols()],
            }))
        }

        fn load(&self, path: &Path) -> Result<Box<dyn ForestModel>, ArborError> {
            let bytes = fs::read(path)?;
            let class = f64::from_le_bytes(bytes.try_into().map_err(|_| {
                ArborError::Artifact("truncated majority-model artifact".to_string())
            })?);
            Ok(Box::new(MajorityModel {
                class,
                importances: vec![],
            }))
        }
    }

    fn training_frame() -> Frame {
        Frame::new(
            vec![
                ColumnDescriptor::new("x1", DataType::Float64),
                ColumnDescriptor::new("x2", DataType::Float64),
                ColumnDescriptor::new("label", DataType::Int64),
            ],
            vec![
                vec![Value::Float64(0.0), Value::Float64(1.0), Value::Int64(1)],
                vec![Value::Float64(0.1), Value::Float64(0.9), Value::Int64(1)],
                vec![Value::Float64(1.0), Value::Float64(0.0), Value::Int64(0)],
            ],
        )
        .unwrap()
    }

    fn trained() -> RandomForestClassifierModel {
        let config = TrainConfig::new("label", vec!["x1".to_string(), "x2".to_string()])
            .with_seed(7);
        RandomForestClassifierModel::train(&MajorityEngine, &training_frame(), config).unwrap()
    }

    #[test]
    fn predict_appends_one_column() {
        let model = trained();
        let out = model.predict(&training_frame(), None).unwrap();
        assert_eq!(out.column_count(), 4);
        assert_eq!(out.schema()[3].name, PREDICTED_CLASS_COLUMN);
        assert_eq!(out.rows()[0][3], Value::Float64(1.0));
    }

    #[test]
    fn debug_output_shows_config_not_model_internals() {
        let model = trained();
        let printed = format!("{:?}", model);
        assert!(printed.starts_with("RandomForestClassifierModel"));
        assert!(printed.contains("config"));
    }

    #[test]
    fn predict_rejects_wrong_column_count() {
        let model = trained();
        let err = model
            .predict(&training_frame(), Some(&["x1".to_string()]))
            .unwrap_err();
        assert!(matches!(
            err,
            ArborError::ColumnCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn importances_pair_names_in_training_order() {
        let model = trained();
        let imp = model.feature_importances();
        assert_eq!(imp.len(), 2);
        assert_eq!(imp[0].0, "x1");
        assert_eq!(imp[1].0, "x2");
    }

    #[test]
    fn score_rejects_empty_and_bad_input() {
        let model = trained();
        assert!(matches!(
            model.score(&[]).unwrap_err(),
            ArborError::ScoringInput(_)
        ));
        let err = model
            .score(&[Value::Str("abc".into()), Value::Float64(1.0)])
            .unwrap_err();
        assert!(matches!(err, ArborError::ScoringInput(_)));
    }

    #[test]
    fn score_appends_predicted_class() {
        let model = trained();
        let out = model
            .score(&[Value::Float64(0.0), Value::Str("1.0".into())])
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], Value::Float64(1.0));
    }

    #[test]
    fn schemas_describe_scoring_io() {
        let model = trained();
        assert_eq!(model.input().len(), 2);
        let output = model.output();
        assert_eq!(output.len(), 3);
        assert_eq!(output[2].name, "PredictedClass");
        assert_eq!(model.scoring_metadata().adapter, ADAPTER_ID);
    }
}
