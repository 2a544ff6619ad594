//! Error taxonomy surfaced by the request controller

use serde_json::Value;
use thiserror::Error;

/// Failure of a single controller call.
///
/// Cloneable so the same failure can be kept in observable request state and
/// returned to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The server answered with a non-2xx status.
    #[error("HTTP error (status {status}): {body}")]
    Http { status: u16, body: Value },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// The call was cancelled through `abort()`.
    #[error("Request aborted")]
    Aborted,

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RequestError::Aborted)
    }

    /// Status code for HTTP errors, `None` for everything else
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Decode(err.to_string())
    }
}
