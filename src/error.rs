use std::error::Error;
use std::fmt;

/// Crate-wide error type covering frame manipulation, hyperparameter
/// validation, engine failures, persistence, and scoring input problems.
#[derive(Debug)]
pub enum ArborError {
    /// A hyperparameter failed validation before training started.
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// A column name would appear twice in a schema.
    DuplicateColumn(String),
    /// A named column does not exist in the frame.
    MissingColumn(String),
    /// A row's width does not match the schema (or declared new columns).
    RowWidthMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },
    /// A whole appended column has the wrong number of values for the frame.
    ColumnLengthMismatch { expected: usize, got: usize },
    /// A value could not be coerced to a floating-point number.
    NonNumericValue { column: String, row: usize },
    /// A caller-supplied column list differs in length from the columns the
    /// model was trained with.
    ColumnCountMismatch { expected: usize, got: usize },
    /// The external engine failed during fit.
    Training(String),
    /// The external engine failed during predict.
    Inference(String),
    /// Persisted metadata carries an unsupported format version.
    FormatVersion { supported: u32, found: u32 },
    /// Scoring input was empty, mis-sized, or not numeric-coercible.
    ScoringInput(String),
    /// Encoding or decoding a persisted artifact failed.
    Artifact(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ArborError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArborError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{}': {}", name, reason)
            }
            ArborError::DuplicateColumn(name) => {
                write!(f, "column '{}' already exists in the schema", name)
            }
            ArborError::MissingColumn(name) => write!(f, "column '{}' not found", name),
            ArborError::RowWidthMismatch { row, expected, got } => {
                write!(f, "row {} has {} values, expected {}", row, got, expected)
            }
            ArborError::ColumnLengthMismatch { expected, got } => write!(
                f,
                "column has {} values, expected {} (one per row)",
                got, expected
            ),
            ArborError::NonNumericValue { column, row } => write!(
                f,
                "value in column '{}' at row {} is not numeric-coercible",
                column, row
            ),
            ArborError::ColumnCountMismatch { expected, got } => write!(
                f,
                "expected {} columns to match the trained observation columns, got {}",
                expected, got
            ),
            ArborError::Training(msg) => write!(f, "training failed: {}", msg),
            ArborError::Inference(msg) => write!(f, "inference failed: {}", msg),
            ArborError::FormatVersion { supported, found } => write!(
                f,
                "unsupported metadata format version {} (supported: {})",
                found, supported
            ),
            ArborError::ScoringInput(msg) => write!(f, "bad scoring input: {}", msg),
            ArborError::Artifact(msg) => write!(f, "model artifact error: {}", msg),
            ArborError::Io(e) => write!(f, "I/O error: {}", e),
            ArborError::Json(e) => write!(f, "metadata serialization error: {}", e),
        }
    }
}

impl Error for ArborError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ArborError::Io(e) => Some(e),
            ArborError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ArborError {
    fn from(e: std::io::Error) -> Self {
        ArborError::Io(e)
    }
}

impl From<serde_json::Error> for ArborError {
    fn from(e: serde_json::Error) -> Self {
        ArborError::Json(e)
    }
}
