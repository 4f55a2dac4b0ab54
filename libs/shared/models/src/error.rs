use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full detail goes to tracing; the caller only ever sees a generic
        // message so that rejection reasons cannot be enumerated.
        let (status, message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "Access denied"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        tracing::error!("Error: {}: {}", status, self);

        let body = Json(json!({
            "success": false,
            "error": message,
            "timestamp": chrono::Utc::now(),
        }));

        (status, body).into_response()
    }
}
