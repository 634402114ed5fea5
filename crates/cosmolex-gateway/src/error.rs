//! Error types for the gameplay gateway.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cosmolex_core::{ActorError, ProgressError};

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A planet, lesson or galaxy is not in the catalog.
    #[error("not found: {0}")]
    NotFound(String),

    /// The endpoint is disabled by configuration.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The progression actor is not running.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A local write failed; the caller may retry.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ActorError> for GatewayError {
    fn from(err: ActorError) -> Self {
        match &err {
            ActorError::Closed => Self::Unavailable(err.to_string()),
            ActorError::Progress(ProgressError::NotFound { .. }) => Self::NotFound(err.to_string()),
            ActorError::Progress(ProgressError::Persistence(_)) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
