use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use nusa_core::{CoreError, ErrorResponse};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to parse request body: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Validation(#[from] CoreError),
    #[error("Failed to search flights: {0}")]
    Search(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, tag) = match &self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Search(msg) => {
                tracing::error!("Search failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "search_error")
            }
        };

        let body = Json(ErrorResponse {
            error: tag.to_string(),
            message: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
