//! Error types for the record-store client

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the record store
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was produced
    #[error("store request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The store answered with an error status code
    #[error("store error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body returned by the store
        message: String,
    },

    /// Failed to decode the response body
    #[error("failed to parse store response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
