//! HTTP mapping for domain errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::AlreadyEnrolled
            | DomainError::AlreadySubmitted
            | DomainError::DuplicateReview
            | DomainError::CourseFull
            | DomainError::AttemptLimitExceeded => StatusCode::CONFLICT,
            DomainError::InvalidRange(_) | DomainError::InvalidAmount => StatusCode::BAD_REQUEST,
            DomainError::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            DomainError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}
