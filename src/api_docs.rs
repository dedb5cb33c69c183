use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::courses::list_courses,
        api::courses::get_course,
        api::courses::get_lesson_quiz,
        api::enrollments::enroll,
        api::enrollments::start,
        api::enrollments::complete,
        api::enrollments::update_progress,
        api::enrollments::sync_progress,
        api::enrollments::get_enrollment,
        api::enrollments::list_enrollments,
        api::enrollments::list_mandatory,
        api::enrollments::list_overdue,
        api::progress::track,
        api::progress::get_lesson,
        api::progress::get_course,
        api::quizzes::get_quiz,
        api::quizzes::start_attempt,
        api::quizzes::submit_attempt,
        api::quizzes::list_attempts,
        api::quizzes::stats,
        api::gamification::get_balance,
        api::gamification::list_transactions,
        api::gamification::spend,
        api::gamification::redeem,
        api::gamification::adjust,
        api::gamification::check_badges,
        api::gamification::list_badges,
        api::certificates::list_certificates,
        api::certificates::verify_certificate,
        api::dashboard::get_dashboard,
        api::reviews::add_review,
        api::reviews::list_reviews,
    ),
    components(
        schemas(
            api::enrollments::CompleteCourseRequest,
            api::enrollments::UpdateProgressRequest,
            api::progress::TrackProgressRequest,
            api::progress::CourseProgress,
            api::quizzes::SubmitAttemptRequest,
            api::gamification::CoinRequest,
            api::reviews::ReviewRequest,
            crate::domain::EnrollmentWithCourse,
            crate::domain::CompletionRecord,
            crate::domain::QuestionWithOptions,
            crate::domain::QuizWithQuestions,
            crate::domain::SubmissionRecord,
            crate::domain::QuizStats,
            crate::domain::TransactionPage,
            crate::domain::CoursePage,
            crate::domain::UserBadge,
            crate::domain::CoinReference,
            crate::services::CourseCompletion,
            crate::services::CourseDetail,
            crate::services::QuizSubmission,
            crate::services::LedgerCheck,
            crate::services::Dashboard,
        )
    ),
    tags(
        (name = "lms-backend", description = "Learning progress, quizzes and rewards")
    )
)]
pub struct ApiDoc;
