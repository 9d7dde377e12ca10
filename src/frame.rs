//! Ordered, named, typed tabular data plus the column-append transform.
//!
//! A `Frame` is immutable: every transform produces a new frame revision and
//! leaves the input untouched. Column names are unique within a schema and
//! schema order is significant (feature vectors are assembled in the order
//! the caller names columns).

use std::collections::HashSet;
use std::fmt;

use crate::error::ArborError;
use crate::math::Array2;

/// Semantic scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int64,
    Float64,
    Str,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Str => "str",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    Str(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Str(_) => DataType::Str,
        }
    }

    /// Numeric coercion: integers widen, floats pass through, strings parse.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// (name, type) pair describing one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered collection of named, typed columns plus row data.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    schema: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Build a frame, enforcing schema-name uniqueness and per-row width.
    pub fn new(schema: Vec<ColumnDescriptor>, rows: Vec<Vec<Value>>) -> Result<Self, ArborError> {
        let mut seen = HashSet::new();
        for column in &schema {
            if !seen.insert(column.name.as_str()) {
                return Err(ArborError::DuplicateColumn(column.name.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(ArborError::RowWidthMismatch {
                    row: i,
                    expected: schema.len(),
                    got: row.len(),
                });
            }
        }
        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &[ColumnDescriptor] {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == name)
    }

    /// Append computed columns via a per-row function.
    ///
    /// The result schema is the original schema with `new_columns` appended
    /// at the end; each result row is the original values followed by the
    /// function's output for that row. The input frame is not mutated.
    ///
    /// # Errors
    ///
    /// Fails with a duplicate-column error if any new name collides with the
    /// existing schema (or repeats within `new_columns`), and with a
    /// width-mismatch error if the row function returns a different number of
    /// values than `new_columns` declares.
    pub fn add_columns<F>(
        &self,
        row_fn: F,
        new_columns: &[ColumnDescriptor],
    ) -> Result<Frame, ArborError>
    where
        F: Fn(&[Value]) -> Vec<Value>,
    {
        let mut seen: HashSet<&str> = self.schema.iter().map(|c| c.name.as_str()).collect();
        for column in new_columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ArborError::DuplicateColumn(column.name.clone()));
            }
        }

        let mut schema = self.schema.clone();
        schema.extend(new_columns.iter().cloned());

        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let produced = row_fn(row);
            if produced.len() != new_columns.len() {
                return Err(ArborError::RowWidthMismatch {
                    row: i,
                    expected: new_columns.len(),
                    got: produced.len(),
                });
            }
            let mut merged = row.clone();
            merged.extend(produced);
            rows.push(merged);
        }

        Ok(Frame { schema, rows })
    }

    /// Append a single pre-computed column.
    pub fn with_column(
        &self,
        descriptor: ColumnDescriptor,
        values: Vec<Value>,
    ) -> Result<Frame, ArborError> {
        if values.len() != self.rows.len() {
            return Err(ArborError::ColumnLengthMismatch {
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        if self.column_index(&descriptor.name).is_some() {
            return Err(ArborError::DuplicateColumn(descriptor.name));
        }
        let mut schema = self.schema.clone();
        schema.push(descriptor);
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, v)| {
                let mut merged = row.clone();
                merged.push(v);
                merged
            })
            .collect();
        Ok(Frame { schema, rows })
    }

    /// Assemble a fixed-order numeric feature matrix from named columns.
    ///
    /// Column order in `columns` is order-significant: the same order must be
    /// used at training time and at every later predict/test/score call.
    pub fn feature_matrix(&self, columns: &[String]) -> Result<Array2<f64>, ArborError> {
        let indices = self.resolve_indices(columns)?;
        let mut data = Vec::with_capacity(self.rows.len() * indices.len());
        for (i, row) in self.rows.iter().enumerate() {
            for &c in &indices {
                let v = row[c].as_f64().ok_or_else(|| ArborError::NonNumericValue {
                    column: self.schema[c].name.clone(),
                    row: i,
                })?;
                data.push(v);
            }
        }
        Array2::from_shape_vec((self.rows.len(), indices.len()), data)
            .map_err(|e| ArborError::Artifact(e.to_string()))
    }

    /// Extract a single named column as f64 values (used for label vectors).
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, ArborError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| ArborError::MissingColumn(name.to_string()))?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row[idx].as_f64().ok_or_else(|| ArborError::NonNumericValue {
                    column: name.to_string(),
                    row: i,
                })
            })
            .collect()
    }

    fn resolve_indices(&self, columns: &[String]) -> Result<Vec<usize>, ArborError> {
        columns
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| ArborError::MissingColumn(name.clone()))
            })
            .collect()
    }
}
