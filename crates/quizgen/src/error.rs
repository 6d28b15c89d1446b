//! Error types for the quiz generator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingestion::FileFailure;

/// Result type alias for quizgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quizgen errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid client input
    #[error("{0}")]
    BadRequest(String),

    /// No uploaded file yielded usable text
    #[error("{message}")]
    BatchEmpty {
        message: String,
        failures: Vec<FileFailure>,
    },

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Quiz not found
    #[error("Quiz not found")]
    QuizNotFound(String),

    /// Database error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document export error
    #[error("Export error: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON supplied by a caller
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status and machine-readable type for this error
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::BatchEmpty { .. } => (StatusCode::BAD_REQUEST, "extraction_failed"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::QuizNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "export_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = match &self {
            Error::BatchEmpty { message, failures } => json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": message,
                },
                "details": failures,
            }),
            _ => json!({
                "success": false,
                "error": {
                    "type": error_type,
                    "message": self.to_string(),
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}
