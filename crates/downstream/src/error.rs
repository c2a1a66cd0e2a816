//! Error types for the downstream clients.

use thiserror::Error;

/// Result type alias for downstream operations.
pub type Result<T> = std::result::Result<T, DownstreamError>;

/// Errors that can occur talking to a downstream service.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the remote service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad URL, bad token, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DownstreamError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<DownstreamError> for recsync_core::Error {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::InvalidRequest(message) => recsync_core::Error::Config(message),
            other => recsync_core::Error::Downstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_retryable_downstream_error() {
        let err: recsync_core::Error = DownstreamError::api(503, "busy").into();
        assert!(matches!(err, recsync_core::Error::Downstream(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_request_is_configuration() {
        let err: recsync_core::Error = DownstreamError::invalid_request("bad token").into();
        assert!(!err.is_retryable());
    }
}
