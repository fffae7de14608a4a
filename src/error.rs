use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("location missing: {0}")]
    LocationMissing(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A collaborator did not answer in time. Callers may retry.
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::LocationMissing(_) => "location_missing",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::LocationMissing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::LocationMissing(msg)
            | AppError::InvalidState(msg)
            | AppError::Unavailable(msg)
            | AppError::Internal(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": message,
            "kind": self.kind(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}
