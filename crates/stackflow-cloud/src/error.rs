//! Cloud driver error types

use thiserror::Error;

/// Errors surfaced by cloud resource drivers.
///
/// Drivers absorb expected-benign API failures (already exists, already
/// gone) themselves; anything that reaches this type aborts the current
/// orchestration phase.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("cloud API error [{}]: {message}", .code.as_deref().unwrap_or("unknown"))]
    ApiError {
        code: Option<String>,
        message: String,
    },

    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<CloudError>,
    },

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn api(message: impl Into<String>) -> Self {
        CloudError::ApiError {
            code: None,
            message: message.into(),
        }
    }

    pub fn api_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::ApiError {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// The service error code, when the underlying API reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::ApiError { code, .. } => code.as_deref(),
            CloudError::RetriesExhausted { source, .. } => source.code(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
