use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use uuid::Uuid;

use super::dto::{JwtKeys, TokenKind};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::AccountTier;

/// The request-scoped identity: who is calling, and at which authority tier.
/// Replaces the ambient "current user" of a browser session with an explicit
/// parameter threaded through every operation.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub id: Uuid,
    pub tier: AccountTier,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.tier == AccountTier::Admin
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::unauthorized("invalid auth scheme"))
}

fn decode_identity(parts: &Parts, state: &AppState) -> Result<Identity, ApiError> {
    let token = bearer_token(parts)?;
    let keys = JwtKeys::from_config(&state.config.jwt);
    let claims = keys
        .verify(token)
        .map_err(|_| ApiError::unauthorized("invalid or expired token"))?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::unauthorized("access token required"));
    }
    Ok(Identity {
        id: claims.sub,
        tier: claims.tier,
    })
}

/// Extracts and validates the JWT, returning the caller identity.
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthIdentity(decode_identity(parts, state)?))
    }
}

/// Like `AuthIdentity`, but only admits admin-tier callers.
pub struct AdminIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = decode_identity(parts, state)?;
        if !identity.is_admin() {
            return Err(ApiError::forbidden("administrator privileges required"));
        }
        Ok(AdminIdentity(identity))
    }
}
