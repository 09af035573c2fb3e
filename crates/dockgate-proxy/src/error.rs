//! The proxy-facing error type: turns a `dockgate_policy::PolicyError` or
//! a lower-level `dockgate_core::Error` into the exact response shape the
//! error taxonomy calls for.

use axum::response::{IntoResponse, Response};
use axum::Json;
use dockgate_policy::PolicyError;
use http::StatusCode;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Engine(#[from] dockgate_core::Error),

    #[error("route not found")]
    NotFound,
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Rejected { status, message } => Self::Rejected { status, message },
            PolicyError::Engine(e) => Self::Engine(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Rejected { status, message } => (status, message),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            Self::Engine(e) => {
                error!(error = %e, "engine-level failure surfaced as 500");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
