use apistate_core::CoreError;
use thiserror::Error;

/// Error types for scenario steps
#[derive(Debug, Error)]
pub enum StepError {
    /// Cache, template or assertion failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON schema could not be loaded or the document does not match it
    #[error("JSON schema error: {0}")]
    Schema(String),

    /// Step argument rejected before doing any work
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Last HTTP response does not meet the expectation
    #[error("Response assertion failed: {0}")]
    ResponseAssertion(String),
}

pub type StepResult<T> = Result<T, StepError>;
