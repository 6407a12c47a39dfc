//! Error types for the chat server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while serving the chat UI or talking to the agent runtime.
#[derive(Error, Debug)]
pub enum ChatError {
    /// HTTP request to the agent runtime failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The agent runtime answered with a non-success status.
    #[error("agent runtime error ({status}): {message}")]
    Agent {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The agent reply stream failed mid-flight.
    #[error("stream error: {0}")]
    Stream(String),

    /// The request carried unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration could not be turned into runtime settings.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// HTTP status used when this error reaches a handler boundary.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Http(_) | Self::Agent { .. } | Self::Stream(_) => StatusCode::BAD_GATEWAY,
            Self::Json(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ChatError::InvalidInput("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::NotFound("thread".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::Agent {
                status: 500,
                message: "boom".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ChatError::Config("bad url".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = ChatError::Agent {
            status: 422,
            message: "unknown assistant".into(),
        };
        assert_eq!(
            err.to_string(),
            "agent runtime error (422): unknown assistant"
        );
    }
}
