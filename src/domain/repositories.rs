//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer. Any method that writes
//! more than one row runs as a single database transaction, so a failure
//! leaves nothing behind.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{BadgeCriteria, CoinReference, DomainError};
use crate::models::{
    BadgeLevel, EnrollmentStatus, QuestionType, Role, TransactionType, badge, badge_progress,
    certificate, coin_transaction, course, course_review, enrollment, lesson, lesson_progress,
    question, question_answer, question_option, quiz, quiz_answer, quiz_attempt, user,
};

// --- Users -----------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub role: Role,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DomainError>;

    async fn create(&self, input: NewUser) -> Result<user::Model, DomainError>;

    /// Number of users with strictly more learning time, plus one
    async fn learning_rank(&self, id: Uuid) -> Result<u64, DomainError>;

    /// Store the streak computed for an activity on `day`, provided the
    /// user's last activity is still `previous` and earlier than `day`.
    /// `None` when another request moved the streak first.
    async fn set_streak(
        &self,
        id: Uuid,
        streak: i32,
        day: NaiveDate,
        previous: Option<NaiveDate>,
    ) -> Result<Option<user::Model>, DomainError>;

    /// Raise `current_badge_level` to `level` when it is currently lower.
    /// Returns whether the level changed.
    async fn raise_badge_level(&self, id: Uuid, level: BadgeLevel) -> Result<bool, DomainError>;
}

// --- Courses & lessons -----------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub is_mandatory: bool,
    pub mandatory_due_date: Option<DateTime<Utc>>,
    pub passing_score: i32,
    pub coins_reward: i64,
    pub max_enrollments: i32,
    pub is_published: bool,
}

impl NewCourse {
    /// A published, optional course with the usual defaults
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            instructor_id: None,
            is_mandatory: false,
            mandatory_due_date: None,
            passing_score: 70,
            coins_reward: 100,
            max_enrollments: 0,
            is_published: true,
        }
    }
}

/// Catalogue filters; only published courses are ever listed
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Matched against title and description
    pub search: Option<String>,
    pub category: Option<String>,
    pub mandatory_only: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoursePage {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<course::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<course::Model>, DomainError>;

    /// Published courses matching `filter`, newest first
    async fn list_published(
        &self,
        filter: CourseFilter,
        page: u64,
        per_page: u64,
    ) -> Result<CoursePage, DomainError>;

    async fn find_by_title(&self, title: &str) -> Result<Option<course::Model>, DomainError>;

    async fn create(&self, input: NewCourse) -> Result<course::Model, DomainError>;
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub course_id: Uuid,
    pub title: String,
    pub order_number: i32,
    pub duration_seconds: i64,
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<lesson::Model>, DomainError>;

    /// Lessons of a course in `order_number` order
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<lesson::Model>, DomainError>;

    async fn create(&self, input: NewLesson) -> Result<lesson::Model, DomainError>;
}

// --- Enrollments -----------------------------------------------------------

/// Enrollment joined with its course
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentWithCourse {
    #[schema(value_type = Object)]
    pub enrollment: enrollment::Model,
    #[schema(value_type = Object)]
    pub course: course::Model,
}

/// Side effects of completing a course, applied together
#[derive(Debug, Clone)]
pub struct CompletionPlan {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub final_score: i32,
    pub is_passed: bool,
    pub completed_at: DateTime<Utc>,
    pub reward: Option<CoinEntry>,
    pub certificate: Option<NewCertificate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompletionRecord {
    #[schema(value_type = Object)]
    pub enrollment: enrollment::Model,
    /// False when the enrollment was already completed and nothing changed
    pub newly_completed: bool,
    #[schema(value_type = Option<Object>)]
    pub transaction: Option<coin_transaction::Model>,
    #[schema(value_type = Option<Object>)]
    pub certificate: Option<certificate::Model>,
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<enrollment::Model>, DomainError>;

    /// Insert a not-started enrollment and bump the course's enrollment
    /// counter. The counter only moves while the course has room
    /// (`CourseFull` otherwise) and the unique (user, course) index turns a
    /// concurrent duplicate into `AlreadyEnrolled`.
    async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError>;

    /// Move a not-started or in-progress enrollment to in progress.
    /// Completed enrollments are returned untouched.
    async fn mark_started(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError>;

    /// Store `progress` on a not-completed enrollment.
    /// Completed enrollments are returned untouched.
    async fn set_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError>;

    /// Complete the enrollment, bump the course completion counter and apply
    /// the reward and certificate of the plan. Guarded by
    /// `status != completed`, so a second call changes nothing.
    async fn complete(&self, plan: CompletionPlan) -> Result<CompletionRecord, DomainError>;

    /// A user's enrollments, optionally filtered by status, newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError>;

    /// Enrollments in mandatory courses, earliest due date first
    async fn list_mandatory(
        &self,
        user_id: Uuid,
        incomplete_only: bool,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError>;

    /// Incomplete enrollments in mandatory courses due before `now`, all users
    async fn list_overdue(&self, now: DateTime<Utc>)
    -> Result<Vec<EnrollmentWithCourse>, DomainError>;

    async fn count_by_status(
        &self,
        user_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<u64, DomainError>;

    /// Mean final score over the user's completed enrollments
    async fn average_final_score(&self, user_id: Uuid) -> Result<Option<f64>, DomainError>;
}

// --- Lesson progress -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub watched_seconds: i64,
    pub total_seconds: i64,
    pub progress_percentage: i32,
    /// The new percentage reaches the completion threshold
    pub reaches_completion: bool,
    /// Learning time added to the user on first completion
    pub credited_seconds: i64,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<lesson_progress::Model>, DomainError>;

    /// Fetch-or-create the (user, course, lesson) row and store the update.
    /// A row that is already completed stays completed and keeps its
    /// `completed_at`. The first completion adds `total_seconds` to the
    /// user's learning time in the same transaction.
    async fn save(&self, update: ProgressUpdate) -> Result<lesson_progress::Model, DomainError>;

    /// A user's rows for one course, in lesson order
    async fn list_for_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<lesson_progress::Model>, DomainError>;
}

// --- Quizzes ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionWithOptions {
    #[schema(value_type = Object)]
    pub question: question::Model,
    #[schema(value_type = Vec<Object>)]
    pub options: Vec<question_option::Model>,
    #[serde(skip)]
    pub accepted_answers: Vec<question_answer::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizWithQuestions {
    #[schema(value_type = Object)]
    pub quiz: quiz::Model,
    pub questions: Vec<QuestionWithOptions>,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub course_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub passing_score: i32,
    pub max_attempts: i32,
    pub time_limit_minutes: Option<i32>,
    pub coins_reward: i64,
}

#[derive(Debug, Clone)]
pub struct NewOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct NewAcceptedAnswer {
    pub text: String,
    pub is_partial_ok: bool,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub quiz_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub order_number: i32,
    pub options: Vec<NewOption>,
    pub accepted_answers: Vec<NewAcceptedAnswer>,
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<quiz::Model>, DomainError>;

    /// Quizzes of a course in creation order
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<quiz::Model>, DomainError>;

    async fn find_by_lesson(&self, lesson_id: Uuid) -> Result<Option<quiz::Model>, DomainError>;

    /// Quiz with its questions and options, all in `order_number` order
    async fn find_with_questions(&self, id: Uuid)
    -> Result<Option<QuizWithQuestions>, DomainError>;

    async fn create(&self, input: NewQuiz) -> Result<quiz::Model, DomainError>;

    async fn add_question(&self, input: NewQuestion) -> Result<QuestionWithOptions, DomainError>;
}

/// Outcome of grading one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub user_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    pub attempt_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub is_passed: bool,
    pub time_spent_seconds: i32,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<GradedAnswer>,
    pub reward: Option<CoinEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionRecord {
    #[schema(value_type = Object)]
    pub attempt: quiz_attempt::Model,
    #[schema(value_type = Vec<Object>)]
    pub answers: Vec<quiz_answer::Model>,
    #[schema(value_type = Option<Object>)]
    pub transaction: Option<coin_transaction::Model>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct QuizStats {
    pub total_attempts: u64,
    pub passed_attempts: u64,
    /// Percentage of submitted attempts that passed
    pub pass_rate: f64,
    pub average_percentage: f64,
}

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<quiz_attempt::Model>, DomainError>;

    async fn count_for(&self, user_id: Uuid, quiz_id: Uuid) -> Result<u64, DomainError>;

    /// Count prior attempts and insert the next one in one transaction.
    /// Fails with `AttemptLimitExceeded` when `max_attempts > 0` and the
    /// limit is reached. A duplicate attempt number from a concurrent start
    /// is retried with a fresh count.
    async fn start(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        max_attempts: i32,
        at: DateTime<Utc>,
    ) -> Result<quiz_attempt::Model, DomainError>;

    /// Stamp the attempt as submitted, store its answers and reward.
    /// Guarded by `submitted_at IS NULL`; a second submission fails with
    /// `AlreadySubmitted`.
    async fn submit(&self, plan: SubmissionPlan) -> Result<SubmissionRecord, DomainError>;

    /// A user's attempts at a quiz by attempt number
    async fn list_for(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Vec<quiz_attempt::Model>, DomainError>;

    async fn answers_for(&self, attempt_id: Uuid) -> Result<Vec<quiz_answer::Model>, DomainError>;

    /// Submitted attempts of the user scoring 100%
    async fn count_perfect(&self, user_id: Uuid) -> Result<u64, DomainError>;

    async fn stats(&self, quiz_id: Uuid) -> Result<QuizStats, DomainError>;
}

// --- Coins -----------------------------------------------------------------

/// A ledger row to append. `amount` is signed.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinEntry {
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub reason: String,
    pub reference: Option<CoinReference>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionPage {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<coin_transaction::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[async_trait]
pub trait CoinLedgerRepository: Send + Sync {
    /// Append the entry and move the cached balance by its amount in one
    /// transaction. A debit larger than the balance fails with
    /// `InsufficientBalance` and writes nothing.
    async fn append(&self, entry: CoinEntry) -> Result<coin_transaction::Model, DomainError>;

    /// Cached balance on the user row
    async fn balance(&self, user_id: Uuid) -> Result<i64, DomainError>;

    /// Sum of all ledger rows of the user
    async fn ledger_sum(&self, user_id: Uuid) -> Result<i64, DomainError>;

    /// Sum of positive `earned` and `admin_adjustment` rows
    async fn total_earned(&self, user_id: Uuid) -> Result<i64, DomainError>;

    /// Most recent rows first
    async fn recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<coin_transaction::Model>, DomainError>;

    /// One page (0-based) of the ledger, newest first
    async fn page(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<TransactionPage, DomainError>;
}

// --- Badges ----------------------------------------------------------------

/// Badge row with its decoded criteria
#[derive(Debug, Clone)]
pub struct BadgeDefinition {
    pub badge: badge::Model,
    pub criteria: BadgeCriteria,
}

#[derive(Debug, Clone)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub level: BadgeLevel,
    pub criteria: BadgeCriteria,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserBadge {
    #[schema(value_type = Object)]
    pub badge: badge::Model,
    #[schema(value_type = Object)]
    pub progress: badge_progress::Model,
}

#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// All badges whose criteria decode; the others are skipped with a warning
    async fn definitions(&self) -> Result<Vec<BadgeDefinition>, DomainError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<badge::Model>, DomainError>;

    async fn create(&self, input: NewBadge) -> Result<badge::Model, DomainError>;

    async fn progress_for(&self, user_id: Uuid)
    -> Result<Vec<badge_progress::Model>, DomainError>;

    /// Upsert the progress of an unearned badge. Earned rows are not touched.
    async fn set_progress(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        progress: i32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Mark the badge earned unless it already is. Returns whether this call
    /// earned it.
    async fn mark_earned(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    async fn count_earned(&self, user_id: Uuid) -> Result<u64, DomainError>;

    /// Badges the user has progress on, earned ones first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>, DomainError>;
}

// --- Certificates ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct NewCertificate {
    pub certificate_number: String,
    pub score: i32,
    pub issued_at: DateTime<Utc>,
}

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<certificate::Model>, DomainError>;

    async fn find_by_number(&self, number: &str)
    -> Result<Option<certificate::Model>, DomainError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<certificate::Model>, DomainError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64, DomainError>;
}

// --- Reviews ---------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<course_review::Model>, DomainError>;

    /// Insert the review and recompute the course's average rating.
    /// The unique (user, course) index turns a duplicate into `DuplicateReview`.
    async fn add(&self, input: NewReview) -> Result<course_review::Model, DomainError>;

    /// Reviews of a course, newest first
    async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<course_review::Model>, DomainError>;
}
