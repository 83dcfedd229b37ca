//! Error types for decon-utils.

use thiserror::Error;

/// Typed failures raised by the readers and transforms.
///
/// Public functions return `anyhow::Result`; these variants travel inside the
/// `anyhow::Error` and can be recovered with `downcast_ref::<DeconError>()`.
#[derive(Error, Debug)]
pub enum DeconError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("invalid value '{value}' at row {row}, column '{column}'")]
    InvalidValue {
        value: String,
        row: usize,
        column: String,
    },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}
