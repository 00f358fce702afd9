use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    auth::{AuthError, ReconcileError},
    db::StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            AppError::Reconcile(e @ ReconcileError::MissingRequiredClaim(_)) => {
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            AppError::Reconcile(e @ ReconcileError::StoreUnavailable(_)) => {
                tracing::warn!(error = %e, "Sign-in failed: user store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "User store unavailable".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => {
                tracing::warn!(error = %e, "User store request failed");
                (StatusCode::SERVICE_UNAVAILABLE, "User store unavailable".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
