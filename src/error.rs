use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use thiserror::Error;

use crate::constants::LOGIN_PATH;

/// Failures raised by the file and remote adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response shape: {0}")]
    Schema(String),
    #[error("Remote store error: {0}")]
    Api(String),
    #[error("Session is no longer valid")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} with this ID already exists")]
    Conflict(&'static str),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    AuthFailed(String),
    #[error("Not logged in")]
    Unauthenticated,
    #[error("Failed to {action}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// Wraps an adapter failure. Not-found and expired sessions keep their own
    /// meaning; everything else becomes a generic "failed to ..." error.
    pub fn store(action: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(kind) => Self::NotFound(format!("{kind} not found")),
            StoreError::Conflict(_) => Self::Conflict(source.to_string()),
            StoreError::Unauthorized => Self::Unauthenticated,
            source => Self::Store { action, source },
        }
    }
}

impl From<(StatusCode, String)> for AppError {
    fn from((status, message): (StatusCode, String)) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::UNAUTHORIZED => Self::AuthFailed(message),
            _ => Self::Validation(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated => return Redirect::to(LOGIN_PATH).into_response(),
            Self::Store { action, source } => {
                tracing::error!(action = *action, error = %source, "store operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
