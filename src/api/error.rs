use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Core(CoreError::ContentRejected) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "content_rejected")
            }
            ApiError::Core(CoreError::InvalidInput(_)) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "malformed_payload"),
        };

        let body = ErrorResponse {
            success: false,
            error: code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
