//! Error types for model validation.

use thiserror::Error;

/// Errors raised while validating model values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// A column name appears more than once in a dataset summary.
    #[error("duplicate column name in summary: {column}")]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },

    /// The declared column count disagrees with the listed column names.
    #[error("summary declares {declared} columns but lists {listed} names")]
    ColumnCountMismatch {
        /// Value of the `columns` field.
        declared: usize,
        /// Length of `column_names`.
        listed: usize,
    },
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
