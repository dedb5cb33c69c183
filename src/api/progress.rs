use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{DomainError, Principal};
use crate::infrastructure::AppState;
use crate::models::lesson_progress;

#[derive(Deserialize, ToSchema)]
pub struct TrackProgressRequest {
    pub watched_seconds: i64,
    pub total_seconds: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub overall_progress: i32,
    #[schema(value_type = Vec<Object>)]
    pub lessons: Vec<lesson_progress::Model>,
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/lessons/{lesson_id}/progress",
    params(
        ("course_id" = Uuid, Path, description = "Course"),
        ("lesson_id" = Uuid, Path, description = "Lesson of the course")
    ),
    request_body = TrackProgressRequest,
    responses(
        (status = 200, description = "Lesson progress recorded"),
        (status = 400, description = "Invalid watch time")
    )
)]
pub async fn track(
    principal: Principal,
    State(state): State<AppState>,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TrackProgressRequest>,
) -> Result<Json<lesson_progress::Model>, DomainError> {
    let progress = state
        .progress
        .track_progress(
            principal.user_id,
            course_id,
            lesson_id,
            payload.watched_seconds,
            payload.total_seconds,
        )
        .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons/{lesson_id}/progress",
    params(
        ("course_id" = Uuid, Path, description = "Course"),
        ("lesson_id" = Uuid, Path, description = "Lesson of the course")
    ),
    responses(
        (status = 200, description = "Lesson progress"),
        (status = 404, description = "No progress recorded")
    )
)]
pub async fn get_lesson(
    principal: Principal,
    State(state): State<AppState>,
    Path((course_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<lesson_progress::Model>, DomainError> {
    let progress = state
        .progress
        .get_lesson_progress(principal.user_id, course_id, lesson_id)
        .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons/progress",
    params(("course_id" = Uuid, Path, description = "Course")),
    responses((status = 200, description = "Per-lesson progress and the course average", body = CourseProgress))
)]
pub async fn get_course(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseProgress>, DomainError> {
    let lessons = state
        .progress
        .get_course_progress(principal.user_id, course_id)
        .await?;
    let overall_progress = state
        .progress
        .calculate_course_progress(principal.user_id, course_id)
        .await?;

    Ok(Json(CourseProgress {
        course_id,
        overall_progress,
        lessons,
    }))
}
