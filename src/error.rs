//! ==============================================================================
//! error.rs - error types for the show host
//! ==============================================================================
//!
//! purpose:
//!     `Error` covers failures inside the host (config, storage, json).
//!     `ApiError` is what a request handler returns; it renders as an http
//!     status plus the `{"error": "..."}` body every front-end expects.
//!
//! ==============================================================================

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Failures raised by the host itself.
#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid toml for our schema.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values parsed but make no sense together.
    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

/// Request-level failures, one variant per http status we answer with.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    /// 400 - payload missing or out of range.
    #[error("{0}")]
    BadRequest(String),

    /// 401 - wrong admin password.
    #[error("Invalid password")]
    Unauthorized,

    /// 409 - request conflicts with the current state (e.g. answering a validated session).
    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            // login clients check `success` rather than the status code
            Self::Unauthorized => serde_json::json!({ "success": false, "error": self.to_string() }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
