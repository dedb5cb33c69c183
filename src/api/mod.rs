pub mod certificates;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod error;
pub mod gamification;
pub mod health;
pub mod progress;
pub mod quizzes;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Course catalogue
        .route("/courses", get(courses::list_courses))
        .route("/courses/:course_id", get(courses::get_course))
        .route("/lessons/:lesson_id/quiz", get(courses::get_lesson_quiz))
        // Enrollments
        .route("/enrollments", get(enrollments::list_enrollments))
        .route("/enrollments/mandatory", get(enrollments::list_mandatory))
        .route("/enrollments/overdue", get(enrollments::list_overdue))
        .route("/courses/:course_id/enroll", post(enrollments::enroll))
        .route("/courses/:course_id/start", post(enrollments::start))
        .route(
            "/users/:user_id/courses/:course_id/complete",
            post(enrollments::complete),
        )
        .route(
            "/courses/:course_id/enrollment",
            get(enrollments::get_enrollment),
        )
        .route(
            "/courses/:course_id/progress",
            axum::routing::put(enrollments::update_progress),
        )
        .route(
            "/courses/:course_id/progress/sync",
            post(enrollments::sync_progress),
        )
        // Lesson progress
        .route(
            "/courses/:course_id/lessons/progress",
            get(progress::get_course),
        )
        .route(
            "/courses/:course_id/lessons/:lesson_id/progress",
            get(progress::get_lesson).post(progress::track),
        )
        // Reviews
        .route(
            "/courses/:course_id/reviews",
            get(reviews::list_reviews).post(reviews::add_review),
        )
        // Quizzes
        .route("/quizzes/:quiz_id", get(quizzes::get_quiz))
        .route(
            "/quizzes/:quiz_id/attempts",
            get(quizzes::list_attempts).post(quizzes::start_attempt),
        )
        .route(
            "/quizzes/:quiz_id/attempts/:attempt_id/submit",
            post(quizzes::submit_attempt),
        )
        .route("/quizzes/:quiz_id/stats", get(quizzes::stats))
        // Coins
        .route("/coins/balance", get(gamification::get_balance))
        .route("/coins/transactions", get(gamification::list_transactions))
        .route("/coins/spend", post(gamification::spend))
        .route("/coins/redeem", post(gamification::redeem))
        .route("/users/:user_id/coins/adjust", post(gamification::adjust))
        // Badges
        .route("/badges", get(gamification::list_badges))
        .route("/badges/check", post(gamification::check_badges))
        // Certificates
        .route("/certificates", get(certificates::list_certificates))
        .route(
            "/certificates/:number",
            get(certificates::verify_certificate),
        )
        // Dashboard
        .route("/dashboard", get(dashboard::get_dashboard))
        .with_state(state)
}
