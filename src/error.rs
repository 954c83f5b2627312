use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;

/// A request that ends in a JSON `{error, message}` body.
#[derive(Debug, Error)]
#[error("{error}: {message}")]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Display) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.to_string(),
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn internal(error: impl Into<String>, message: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, message)
    }

    pub fn unavailable(error: impl Into<String>, message: impl Display) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
