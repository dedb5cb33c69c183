//! Services Layer
//!
//! Business rules of the learning platform. Services receive their
//! repositories at construction and never touch the database directly.

pub mod catalog_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod gamification_service;
pub mod grading;
pub mod progress_service;
pub mod quiz_service;
pub mod review_service;

pub use catalog_service::{CatalogService, CourseDetail};
pub use dashboard_service::{Dashboard, DashboardService};
pub use enrollment_service::{CourseCompletion, EnrollmentService};
pub use gamification_service::{ActivityRecord, GamificationService, LedgerCheck};
pub use grading::{AnswerGrader, OptionGrader, TextAnswerGrader};
pub use progress_service::ProgressService;
pub use quiz_service::{QuizService, QuizSubmission};
pub use review_service::ReviewService;

use crate::domain::DomainError;

/// Largest page size a listing returns
pub const MAX_PER_PAGE: u64 = 100;

/// Clamp `per_page` to `1..=MAX_PER_PAGE` and reject pages whose offset
/// does not fit a SQLite integer.
pub fn checked_page(page: u64, per_page: u64) -> Result<u64, DomainError> {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let in_range = page
        .checked_mul(per_page)
        .is_some_and(|offset| offset <= i64::MAX as u64);
    if !in_range {
        return Err(DomainError::InvalidRange(format!(
            "page {} is out of range",
            page
        )));
    }
    Ok(per_page)
}
