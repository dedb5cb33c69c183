//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! Every failure is terminal: the operation that produced it has left no
//! partial state behind.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Entity does not exist (or has been deleted)
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("user is already enrolled in this course")]
    AlreadyEnrolled,
    #[error("quiz attempt has already been submitted")]
    AlreadySubmitted,
    #[error("user has already reviewed this course")]
    DuplicateReview,
    #[error("course has reached its enrollment limit")]
    CourseFull,
    #[error("maximum number of quiz attempts reached")]
    AttemptLimitExceeded,
    /// Numeric input outside its allowed range
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient coin balance")]
    InsufficientBalance,
    /// Principal lacks the role required for the operation
    #[error("forbidden")]
    Forbidden,
    /// Opaque persistence failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Stable machine-readable kind, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::AlreadyEnrolled => "ALREADY_ENROLLED",
            DomainError::AlreadySubmitted => "ALREADY_SUBMITTED",
            DomainError::DuplicateReview => "DUPLICATE_REVIEW",
            DomainError::CourseFull => "COURSE_FULL",
            DomainError::AttemptLimitExceeded => "ATTEMPT_LIMIT_EXCEEDED",
            DomainError::InvalidRange(_) => "INVALID_RANGE",
            DomainError::InvalidAmount => "INVALID_AMOUNT",
            DomainError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            DomainError::Forbidden => "FORBIDDEN",
            DomainError::Storage(_) => "STORAGE",
        }
    }
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// True when the database rejected a write because of a unique index
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
