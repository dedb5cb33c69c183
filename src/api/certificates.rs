use axum::{
    Json,
    extract::{Path, State},
};

use crate::domain::{DomainError, Principal};
use crate::infrastructure::AppState;
use crate::models::certificate;

#[utoipa::path(
    get,
    path = "/api/certificates",
    responses((status = 200, description = "Certificates issued to the caller"))
)]
pub async fn list_certificates(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<certificate::Model>>, DomainError> {
    Ok(Json(
        state.enrollments.list_certificates(principal.user_id).await?,
    ))
}

/// Public lookup, anyone holding the number can check it
#[utoipa::path(
    get,
    path = "/api/certificates/{number}",
    params(("number" = String, Path, description = "Certificate number, e.g. CERT-0A1B2C3D4E5F6071")),
    responses(
        (status = 200, description = "Certificate is genuine"),
        (status = 404, description = "Unknown certificate")
    )
)]
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<certificate::Model>, DomainError> {
    Ok(Json(state.enrollments.verify_certificate(&number).await?))
}
