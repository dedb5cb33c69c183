use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::domain::{CourseFilter, CoursePage, DomainError, Principal};
use crate::infrastructure::AppState;
use crate::models::quiz;
use crate::services::CourseDetail;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseQuery {
    /// Words looked up in titles and descriptions
    pub q: Option<String>,
    pub category: Option<String>,
    /// Only mandatory courses
    #[serde(default)]
    pub mandatory: bool,
    /// 0-based
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Published courses, public
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Published courses, newest first", body = CoursePage),
        (status = 400, description = "Page out of range")
    )
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<CoursePage>, DomainError> {
    let filter = CourseFilter {
        search: query.q,
        category: query.category,
        mandatory_only: query.mandatory,
    };
    let page = state
        .catalog
        .list_courses(
            filter,
            query.page.unwrap_or(0),
            query.per_page.unwrap_or(20),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(("course_id" = Uuid, Path, description = "Published course")),
    responses(
        (status = 200, description = "Course with ordered lessons and its quizzes", body = CourseDetail),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseDetail>, DomainError> {
    Ok(Json(state.catalog.get_course(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}/quiz",
    params(("lesson_id" = Uuid, Path, description = "Lesson the quiz belongs to")),
    responses(
        (status = 200, description = "Quiz attached to the lesson"),
        (status = 404, description = "Lesson or quiz not found")
    )
)]
pub async fn get_lesson_quiz(
    _principal: Principal,
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<quiz::Model>, DomainError> {
    Ok(Json(state.catalog.get_lesson_quiz(lesson_id).await?))
}
