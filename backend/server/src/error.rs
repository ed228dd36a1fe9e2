use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::form::FieldErrors;

/// Failures coming back from the campaign store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store read failed: {0}")]
    Read(String),

    #[error("Store write failed: {0}")]
    Write(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Not found")]
    NotFound,

    #[error("Please correct the highlighted fields")]
    Validation(FieldErrors),

    #[error("Failed to load campaigns. Please try again.")]
    StoreRead(#[source] StoreError),

    #[error("Failed to create campaign. Please try again.")]
    StoreWrite(#[source] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Read(_) => AppError::StoreRead(err),
            StoreError::Write(_) => AppError::StoreWrite(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreRead { .. } | AppError::StoreWrite { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config { .. } | AppError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::Validation(fields) => json!({ "error": self.to_string(), "fields": fields }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_direction() {
        let read: AppError = StoreError::Read("timeout".into()).into();
        let write: AppError = StoreError::Write("denied".into()).into();

        assert!(matches!(read, AppError::StoreRead(StoreError::Read(_))));
        assert!(matches!(write, AppError::StoreWrite(StoreError::Write(_))));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MalformedPayload.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation(FieldErrors::default())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(StoreError::Write("x".into()))
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
