//! Error types for API access and client-side validation

use thiserror::Error;

use crate::models::Resource;
use crate::validation::ValidationErrors;

pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` is what the server said, verbatim when possible
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
    },

    #[error("Failed to decode response from {url}: {reason}")]
    Decode {
        url: String,
        reason: String,
    },

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Resource '{0}' is read-only")]
    ReadOnly(Resource),

    #[error("Not signed in. Run 'rosecandle login' first")]
    NotAuthenticated,

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    InvalidState(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    /// Text shown to the user in an alert or toast
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status of a rejected request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}
