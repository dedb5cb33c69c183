pub mod badge;
pub mod badge_progress;
pub mod certificate;
pub mod coin_transaction;
pub mod course;
pub mod course_review;
pub mod enrollment;
pub mod enums;
pub mod lesson;
pub mod lesson_progress;
pub mod question;
pub mod question_answer;
pub mod question_option;
pub mod quiz;
pub mod quiz_answer;
pub mod quiz_attempt;
pub mod user;

pub use enums::{BadgeLevel, EnrollmentStatus, QuestionType, Role, TransactionType};
