use thiserror::Error;

/// Caller programming errors: a filter or metric names something the
/// dataset does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("metric column not found: {0}")]
    MissingMetric(String),

    #[error("metric column is not numeric: {0}")]
    NonNumericMetric(String),
}

/// Malformed input arriving from the presentation boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed date '{input}' (expected format {format})")]
    MalformedDate { input: String, format: String },
}

/// Error returned by the filter engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EngineError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}
