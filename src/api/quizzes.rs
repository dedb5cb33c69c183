use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{DomainError, Principal, QuizStats, QuizWithQuestions};
use crate::infrastructure::AppState;
use crate::models::quiz_attempt;
use crate::services::QuizSubmission;

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttemptRequest {
    /// Question id to the chosen option id or the typed answer
    pub answers: HashMap<Uuid, String>,
    #[serde(default)]
    pub time_spent_seconds: i32,
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}",
    params(("quiz_id" = Uuid, Path, description = "Quiz")),
    responses(
        (status = 200, description = "Quiz with its questions, answers hidden", body = QuizWithQuestions),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn get_quiz(
    _principal: Principal,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<QuizWithQuestions>, DomainError> {
    Ok(Json(state.quiz.get_quiz(quiz_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/quizzes/{quiz_id}/attempts",
    params(("quiz_id" = Uuid, Path, description = "Quiz")),
    responses(
        (status = 201, description = "Attempt started"),
        (status = 409, description = "No attempts left")
    )
)]
pub async fn start_attempt(
    principal: Principal,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<(StatusCode, Json<quiz_attempt::Model>), DomainError> {
    let attempt = state.quiz.start_attempt(principal.user_id, quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

#[utoipa::path(
    post,
    path = "/api/quizzes/{quiz_id}/attempts/{attempt_id}/submit",
    params(
        ("quiz_id" = Uuid, Path, description = "Quiz"),
        ("attempt_id" = Uuid, Path, description = "Open attempt")
    ),
    request_body = SubmitAttemptRequest,
    responses(
        (status = 200, description = "Graded attempt", body = QuizSubmission),
        (status = 409, description = "Attempt already submitted")
    )
)]
pub async fn submit_attempt(
    principal: Principal,
    State(state): State<AppState>,
    Path((quiz_id, attempt_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Json<QuizSubmission>, DomainError> {
    let submission = state
        .quiz
        .submit_attempt(
            principal.user_id,
            quiz_id,
            attempt_id,
            payload.answers,
            payload.time_spent_seconds,
        )
        .await?;
    Ok(Json(submission))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/attempts",
    params(("quiz_id" = Uuid, Path, description = "Quiz")),
    responses((status = 200, description = "The caller's attempts, oldest first"))
)]
pub async fn list_attempts(
    principal: Principal,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<Vec<quiz_attempt::Model>>, DomainError> {
    let attempts = state.quiz.list_attempts(principal.user_id, quiz_id).await?;
    Ok(Json(attempts))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quiz_id}/stats",
    params(("quiz_id" = Uuid, Path, description = "Quiz")),
    responses(
        (status = 200, description = "Pass rate and average score", body = QuizStats),
        (status = 403, description = "Reporting role required")
    )
)]
pub async fn stats(
    principal: Principal,
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<QuizStats>, DomainError> {
    Ok(Json(state.quiz.quiz_stats(&principal, quiz_id).await?))
}
