use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{DomainError, Principal};
use crate::infrastructure::AppState;
use crate::models::course_review;

#[derive(Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub rating: i32,
    pub review_text: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/reviews",
    params(("course_id" = Uuid, Path, description = "Reviewed course")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review added"),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 409, description = "Course already reviewed")
    )
)]
pub async fn add_review(
    principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<course_review::Model>), DomainError> {
    let review = state
        .reviews
        .add_review(
            principal.user_id,
            course_id,
            payload.rating,
            payload.review_text,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/reviews",
    params(("course_id" = Uuid, Path, description = "Reviewed course")),
    responses((status = 200, description = "Reviews, newest first"))
)]
pub async fn list_reviews(
    _principal: Principal,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<course_review::Model>>, DomainError> {
    Ok(Json(state.reviews.list_reviews(course_id).await?))
}
