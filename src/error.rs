//! Error types for the prediction pipeline

use thiserror::Error;

/// Failure of the underlying model's predict operation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model expects column '{0}' but the feature row does not contain it")]
    MissingColumn(String),

    #[error("column '{column}' cannot be fed to a {expected} input")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("model produced no usable class output")]
    NoClassOutput,

    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by a single prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{field} '{value}' does not match the DD-MM-YYYY format")]
    InvalidDateFormat { field: &'static str, value: String },

    #[error("unrecognized present status '{0}' (expected Completed, Ongoing, Not Started or Delayed)")]
    UnrecognizedStatus(String),

    #[error("{field} must be a finite, non-negative amount (got {value})")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("division by zero: {0} is zero")]
    DivisionByZero(&'static str),

    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),
}

impl PredictError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDateFormat { .. } => "invalid_date_format",
            Self::UnrecognizedStatus(_) => "unrecognized_status",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::DivisionByZero(_) => "division_by_zero",
            Self::ModelInvocation(_) => "model_invocation",
        }
    }

    /// Whether the failure is caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ModelInvocation(_))
    }
}
