//! Repository implementations using SeaORM

pub mod badge_repository;
pub mod certificate_repository;
pub mod coin_ledger_repository;
pub mod course_repository;
pub mod enrollment_repository;
pub mod progress_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod review_repository;
pub mod user_repository;

pub use badge_repository::SeaOrmBadgeRepository;
pub use certificate_repository::SeaOrmCertificateRepository;
pub use coin_ledger_repository::SeaOrmCoinLedgerRepository;
pub use course_repository::{SeaOrmCourseRepository, SeaOrmLessonRepository};
pub use enrollment_repository::SeaOrmEnrollmentRepository;
pub use progress_repository::SeaOrmProgressRepository;
pub use quiz_attempt_repository::SeaOrmQuizAttemptRepository;
pub use quiz_repository::SeaOrmQuizRepository;
pub use review_repository::SeaOrmReviewRepository;
pub use user_repository::SeaOrmUserRepository;
