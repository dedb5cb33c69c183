//! Bearer-token authentication.
//!
//! Tokens carry the user id and role; the services trust the resulting
//! [`Principal`] as-is.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde_json::json;

use crate::domain::Principal;
use crate::infrastructure::AppState;
use crate::models::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal::new(claims.sub, claims.role)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing Authorization header", "code": "UNAUTHORIZED" })),
            ))?;

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid Authorization header format", "code": "UNAUTHORIZED" })),
            ));
        };

        decode_jwt(state.jwt_secret(), token)
            .map(Principal::from)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Invalid or expired token", "code": "UNAUTHORIZED" })),
                )
            })
    }
}

pub fn create_jwt(
    secret: &SecretString,
    principal: &Principal,
    valid_for: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (Utc::now() + valid_for).timestamp().max(0);

    let claims = Claims {
        sub: principal.user_id,
        role: principal.role,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
}

pub fn decode_jwt(
    secret: &SecretString,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
