//! Error taxonomy shared by every pipeline stage

use thiserror::Error;

/// Errors produced while encoding answers, aligning columns or loading artifacts
#[derive(Debug, Error)]
pub enum Error {
    /// A label is not part of the field's fixed vocabulary
    #[error("invalid label {label:?} for field {field}")]
    InvalidCategoryLabel { field: String, label: String },

    /// A numeric field was used where a categorical one is required
    #[error("{0} is numeric and has no vocabulary")]
    NotCategorical(String),

    /// A field name that the codec does not know about
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A required answer was not supplied at all
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A numeric answer falls outside its configured bounds
    #[error("{field} value {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The model artifact or column manifest cannot be used
    #[error("failed to load model artifacts: {0}")]
    ModelLoad(String),

    /// The pipeline configuration cannot be read or is inconsistent
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A vector or matrix does not have the width the model expects
    #[error("expected {expected} columns, found {found}")]
    ColumnMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Data(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the caller's answers rather than by the deployment
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidCategoryLabel { .. }
                | Error::UnknownField(_)
                | Error::NotCategorical(_)
                | Error::MissingField(_)
                | Error::OutOfRange { .. }
        )
    }
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
