use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::BehaviorType;

/// Rejection of a malformed or incomplete interaction event
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} is required for {behavior} behavior")]
    MissingBehaviorField {
        field: &'static str,
        behavior: BehaviorType,
    },

    #[error("{field} must be at least 1, got {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("unsupported behavior type: {0}")]
    UnsupportedBehavior(String),
}

/// Failure talking to the external scorer
#[derive(thiserror::Error, Debug)]
pub enum ScorerError {
    #[error("scorer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("scorer returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Feedback could not be delivered to the scorer
#[derive(thiserror::Error, Debug)]
#[error("failed to dispatch feedback: {0}")]
pub struct DispatchError(#[from] pub ScorerError);

/// Stored book status outside the known set
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown book status: {0}")]
pub struct UnknownBookStatus(pub String);

/// Catalog batch lookup failure
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("catalog query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    #[error("Recommendation engine error: {0}")]
    Scorer(#[from] ScorerError),

    #[error("Catalog error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Dispatch(_) | AppError::Scorer(_) => StatusCode::BAD_GATEWAY,
            AppError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
