use axum::{Json, extract::State};

use crate::domain::{DomainError, Principal};
use crate::infrastructure::AppState;
use crate::services::Dashboard;

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Learner dashboard", body = Dashboard),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_dashboard(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, DomainError> {
    Ok(Json(state.dashboard.get_dashboard(principal.user_id).await?))
}
