use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::StoreError;
use crate::routes::ErrorResponse;

/// Errors surfaced to HTTP callers. Publishing never produces one.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("failed to read site document: {0}")]
    Read(#[source] StoreError),

    #[error("failed to update site document: {0}")]
    Update(#[source] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Body(rejection) => {
                tracing::warn!(error = %self, "rejected request body");
                (rejection.status(), "Invalid request body", rejection.body_text())
            }
            AppError::Read(e) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "DB error", store_message(e))
            }
            AppError::Update(e) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Update failed", store_message(e))
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message: Some(message),
            }),
        )
            .into_response()
    }
}

fn store_message(e: &StoreError) -> String {
    match e {
        StoreError::Unavailable(_) => "storage unavailable",
        StoreError::Malformed(_) => "stored document is not a JSON object",
    }
    .to_string()
}
