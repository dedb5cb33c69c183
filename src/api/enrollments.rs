use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{DomainError, EnrollmentWithCourse, Principal};
use crate::infrastructure::AppState;
use crate::models::{EnrollmentStatus, enrollment};
use crate::services::CourseCompletion;

#[derive(Deserialize, ToSchema)]
pub struct CompleteCourseRequest {
    pub final_score: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    pub progress: i32,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEnrollmentsQuery {
    /// not_started, in_progress or completed
    #[param(value_type = Option<String>)]
    pub status: Option<EnrollmentStatus>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MandatoryQuery {
    /// Hide completed courses
    #[serde(default)]
    pub incomplete_only: bool,
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/enroll",
    params(("course_id" = Uuid, Path, description = "Course to enroll in")),
    responses(
        (status = 201, description = "Enrolled"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled or course full")
    )
)]
pub async fn enroll(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<(StatusCode, Json<enrollment::Model>), DomainError> {
    let enrollment = state
        .enrollments
        .enroll_user(principal.user_id, course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/start",
    params(("course_id" = Uuid, Path, description = "Enrolled course")),
    responses((status = 200, description = "Enrollment marked as started"))
)]
pub async fn start(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<enrollment::Model>, DomainError> {
    let enrollment = state
        .enrollments
        .mark_started(principal.user_id, course_id)
        .await?;
    Ok(Json(enrollment))
}

/// Instructors, HR and admins sign off a learner's course
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/courses/{course_id}/complete",
    params(
        ("user_id" = Uuid, Path, description = "Enrolled learner"),
        ("course_id" = Uuid, Path, description = "Enrolled course")
    ),
    request_body = CompleteCourseRequest,
    responses(
        (status = 200, description = "Course completed", body = CourseCompletion),
        (status = 400, description = "Score out of range"),
        (status = 403, description = "Reporting role required")
    )
)]
pub async fn complete(
    principal: Principal,
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CompleteCourseRequest>,
) -> Result<Json<CourseCompletion>, DomainError> {
    let completion = state
        .enrollments
        .record_completion(&principal, user_id, course_id, payload.final_score)
        .await?;
    Ok(Json(completion))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/progress",
    params(("course_id" = Uuid, Path, description = "Enrolled course")),
    request_body = UpdateProgressRequest,
    responses((status = 200, description = "Progress updated"))
)]
pub async fn update_progress(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<Json<enrollment::Model>, DomainError> {
    let enrollment = state
        .enrollments
        .update_progress(principal.user_id, course_id, payload.progress)
        .await?;
    Ok(Json(enrollment))
}

/// Recompute overall progress from the lesson records
#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/progress/sync",
    params(("course_id" = Uuid, Path, description = "Enrolled course")),
    responses((status = 200, description = "Progress recomputed"))
)]
pub async fn sync_progress(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<enrollment::Model>, DomainError> {
    let enrollment = state
        .enrollments
        .sync_progress(principal.user_id, course_id)
        .await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/enrollment",
    params(("course_id" = Uuid, Path, description = "Enrolled course")),
    responses(
        (status = 200, description = "Enrollment"),
        (status = 404, description = "Not enrolled")
    )
)]
pub async fn get_enrollment(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<enrollment::Model>, DomainError> {
    let enrollment = state
        .enrollments
        .get_enrollment(principal.user_id, course_id)
        .await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses((status = 200, description = "Enrollments with their courses", body = Vec<EnrollmentWithCourse>))
)]
pub async fn list_enrollments(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<ListEnrollmentsQuery>,
) -> Result<Json<Vec<EnrollmentWithCourse>>, DomainError> {
    let enrollments = state
        .enrollments
        .list_enrollments(principal.user_id, query.status)
        .await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/mandatory",
    responses((status = 200, description = "Mandatory enrollments", body = Vec<EnrollmentWithCourse>))
)]
pub async fn list_mandatory(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<MandatoryQuery>,
) -> Result<Json<Vec<EnrollmentWithCourse>>, DomainError> {
    let enrollments = state
        .enrollments
        .list_mandatory(principal.user_id, query.incomplete_only)
        .await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/overdue",
    responses(
        (status = 200, description = "Incomplete mandatory enrollments past their due date", body = Vec<EnrollmentWithCourse>),
        (status = 403, description = "Reporting role required")
    )
)]
pub async fn list_overdue(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentWithCourse>>, DomainError> {
    Ok(Json(state.enrollments.list_overdue(&principal).await?))
}
