//! Dataset summary and dataset handle returned by an upload.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Opaque handle the backend assigns to an uploaded dataset.
///
/// The backend currently hands out integer keys, but the client never
/// interprets the value; it is only echoed back on the next `/clean` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetId {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier.
    Text(String),
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for DatasetId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for DatasetId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// One entry of the summary's missing-value report.
///
/// Older servers list bare column names; newer ones send a record with
/// counts. Both shapes are accepted and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissingValue {
    /// Bare column name.
    Column(String),
    /// Column name with missing counts.
    Detail {
        /// Column with missing entries.
        #[serde(rename = "Column")]
        column: String,
        /// Number of missing entries.
        #[serde(rename = "Missing_Count", default)]
        missing_count: Option<u64>,
        /// Percentage of rows missing.
        #[serde(rename = "Missing_Percentage", default)]
        missing_percentage: Option<f64>,
    },
}

impl MissingValue {
    /// Name of the column with missing data.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Column(column) | Self::Detail { column, .. } => column,
        }
    }
}

/// Summary of the most recently uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of records.
    pub rows: u64,
    /// Number of variables.
    pub columns: usize,
    /// Column names in file order.
    pub column_names: Vec<String>,
    /// Backend type tag per column (free-form, e.g. `int64`, `object`).
    pub data_types: BTreeMap<String, String>,
    /// Columns that contain missing data.
    #[serde(default)]
    pub missing_values: Vec<MissingValue>,
}

impl DatasetSummary {
    /// Check the structural invariants of a summary.
    ///
    /// Column names must be unique and their count must equal `columns`.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.column_names.len());
        for name in &self.column_names {
            if !seen.insert(name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }
        if self.column_names.len() != self.columns {
            return Err(ModelError::ColumnCountMismatch {
                declared: self.columns,
                listed: self.column_names.len(),
            });
        }
        Ok(())
    }

    /// Type tag reported for a column, if any.
    #[must_use]
    pub fn data_type(&self, column: &str) -> Option<&str> {
        self.data_types.get(column).map(String::as_str)
    }

    /// Names of the columns that contain missing data.
    pub fn missing_columns(&self) -> impl Iterator<Item = &str> {
        self.missing_values.iter().map(MissingValue::column)
    }

    /// Numeric columns of this summary, in file order.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.column_names
            .iter()
            .filter(|name| self.data_type(name).is_some_and(is_numeric_type))
            .cloned()
            .collect()
    }
}

/// Whether a backend type tag denotes a numeric column.
///
/// The backend's vocabulary is free-form, so this is a case-sensitive
/// substring test for `int` or `float` rather than an enum match.
#[must_use]
pub fn is_numeric_type(type_tag: &str) -> bool {
    type_tag.contains("float") || type_tag.contains("int")
}

/// Numeric columns of an optional summary; empty when nothing is uploaded.
#[must_use]
pub fn numeric_columns(summary: Option<&DatasetSummary>) -> Vec<String> {
    summary.map(DatasetSummary::numeric_columns).unwrap_or_default()
}
