use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid vote target: {0}")]
    InvalidTarget(String),

    #[error("Duplicate vote: {0}")]
    DuplicateVote(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg)
            | AppError::InvalidTarget(msg)
            | AppError::InsufficientData(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DuplicateVote(msg) | AppError::Duplicate(msg) => {
                (StatusCode::CONFLICT, msg)
            }
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
