//! Versioned metadata record persisted next to the native model artifact.
//!
//! The record is the full training hyperparameter set plus a format version.
//! Optional fields round-trip as present-or-absent JSON keys; an unset option
//! is never conflated with a zero or empty value. Exactly one format version
//! is supported — there is no migration logic at this layer.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::error::ArborError;

/// Supported on-disk metadata format version. Anything else fails on load.
pub const METADATA_FORMAT_VERSION: u32 = 1;

/// File name of the metadata record within a saved model directory.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the engine's native artifact within a saved model directory.
pub const MODEL_FILE: &str = "model.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub format_version: u32,
    #[serde(flatten)]
    pub config: TrainConfig,
}

impl MetadataRecord {
    pub fn new(config: TrainConfig) -> Self {
        Self {
            format_version: METADATA_FORMAT_VERSION,
            config,
        }
    }

    /// Write the record as pretty JSON at `path`.
    pub fn save(&self, path: &Path) -> Result<(), ArborError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("wrote metadata record to {}", path.display());
        Ok(())
    }

    /// Read a record from `path`, rejecting any unsupported format version
    /// before the caller gets a chance to touch the model artifact.
    pub fn load(path: &Path) -> Result<Self, ArborError> {
        let json = fs::read_to_string(path)?;
        let record: MetadataRecord = serde_json::from_str(&json)?;
        if record.format_version != METADATA_FORMAT_VERSION {
            return Err(ArborError::FormatVersion {
                supported: METADATA_FORMAT_VERSION,
                found: record.format_version,
            });
        }
        Ok(record)
    }
}
