//! Error type mapped to an HTTP response, in the teacher's `AppError` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self { status, error: error.into() }
    }

    pub fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, error)
    }

    /// Schema/range validation failures on `POST /metrics/heart-rate`
    /// (spec.md §6 reserves plain 400 for the GET endpoint's malformed
    /// query params).
    pub fn unprocessable(error: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::UNPROCESSABLE_ENTITY, error)
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.error, status = %self.status, "request failed");
        (self.status, Json(json!({ "error": self.error.to_string() }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, error: err.into() }
    }
}
