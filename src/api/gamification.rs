use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{DomainError, Principal, TransactionPage, UserBadge};
use crate::infrastructure::AppState;
use crate::models::{badge, coin_transaction};
use crate::services::LedgerCheck;

#[derive(Deserialize, ToSchema)]
pub struct CoinRequest {
    pub amount: i64,
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionsQuery {
    /// Page number, starting at 0
    pub page: Option<u64>,
    /// Page size, at most 100
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/coins/balance",
    responses((status = 200, description = "Cached balance checked against the ledger", body = LedgerCheck))
)]
pub async fn get_balance(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<LedgerCheck>, DomainError> {
    Ok(Json(
        state.gamification.verify_ledger(principal.user_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/coins/transactions",
    responses((status = 200, description = "Newest transactions first", body = TransactionPage))
)]
pub async fn list_transactions(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionPage>, DomainError> {
    let page = state
        .gamification
        .list_transactions(
            principal.user_id,
            query.page.unwrap_or(0),
            query.per_page.unwrap_or(20),
        )
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/coins/spend",
    request_body = CoinRequest,
    responses(
        (status = 200, description = "Coins spent"),
        (status = 422, description = "Insufficient balance")
    )
)]
pub async fn spend(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<CoinRequest>,
) -> Result<Json<coin_transaction::Model>, DomainError> {
    let row = state
        .gamification
        .spend_coins(principal.user_id, payload.amount, &payload.reason)
        .await?;
    Ok(Json(row))
}

#[utoipa::path(
    post,
    path = "/api/coins/redeem",
    request_body = CoinRequest,
    responses(
        (status = 200, description = "Coins redeemed"),
        (status = 422, description = "Insufficient balance")
    )
)]
pub async fn redeem(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<CoinRequest>,
) -> Result<Json<coin_transaction::Model>, DomainError> {
    let row = state
        .gamification
        .redeem_coins(principal.user_id, payload.amount, &payload.reason)
        .await?;
    Ok(Json(row))
}

/// Admin correction, `amount` may be negative
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/coins/adjust",
    params(("user_id" = Uuid, Path, description = "Learner whose balance is corrected")),
    request_body = CoinRequest,
    responses(
        (status = 200, description = "Balance adjusted"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn adjust(
    principal: Principal,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CoinRequest>,
) -> Result<Json<coin_transaction::Model>, DomainError> {
    let row = state
        .gamification
        .adjust_coins(&principal, user_id, payload.amount, &payload.reason)
        .await?;
    Ok(Json(row))
}

#[utoipa::path(
    post,
    path = "/api/badges/check",
    responses((status = 200, description = "Badges earned by this check"))
)]
pub async fn check_badges(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<badge::Model>>, DomainError> {
    let earned = state
        .gamification
        .check_and_award_badges(principal.user_id)
        .await?;
    Ok(Json(earned))
}

#[utoipa::path(
    get,
    path = "/api/badges",
    responses((status = 200, description = "Every badge with the caller's progress", body = Vec<UserBadge>))
)]
pub async fn list_badges(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserBadge>>, DomainError> {
    Ok(Json(
        state.gamification.list_user_badges(principal.user_id).await?,
    ))
}
