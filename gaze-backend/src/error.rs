//! Error types for gaze-backend
//!
//! Every failure leaves a handler as `{"error": "<message>"}` with a matching
//! status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::csv_patch::PatchError;
use crate::gaze::GazeError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// IO error
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<gaze_common::Error> for ApiError {
    fn from(err: gaze_common::Error) -> Self {
        match err {
            gaze_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            gaze_common::Error::Io(e) => ApiError::Io(e),
            other @ gaze_common::Error::Config(_) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::InvalidPayload(_) | PatchError::EmptyCsv => {
                ApiError::BadRequest(err.to_string())
            }
            PatchError::Io(e) => ApiError::Io(e),
            PatchError::Csv(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<GazeError> for ApiError {
    fn from(err: GazeError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
