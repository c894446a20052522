use crate::services::{object_source::SourceError, profiler::ProfileError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for errors returned by HTTP handlers.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        let message = err.to_string();
        match err {
            ProfileError::IdentityResolution {
                source: SourceError::BucketNotFound(_),
                ..
            } => AppError::not_found(message),
            ProfileError::IdentityResolution { .. } | ProfileError::SourceUnavailable { .. } => {
                AppError::new(StatusCode::BAD_GATEWAY, message)
            }
            ProfileError::Cancelled(_) => AppError::new(StatusCode::SERVICE_UNAVAILABLE, message),
            ProfileError::Write { .. } => AppError::internal(message),
        }
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::BucketNotFound(_) => AppError::not_found(err.to_string()),
            other => AppError::new(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}
