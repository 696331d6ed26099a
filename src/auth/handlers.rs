use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    accounts::{dto::AccountView, services},
    auth::{
        dto::{AuthResponse, JwtKeys, LoginRequest, RefreshRequest, RegisterRequest},
        extractors::AuthIdentity,
    },
    error::ApiError,
    response::Envelope,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Envelope<AccountView>>, ApiError> {
    let account = services::register(
        &*state.store,
        services::Registration {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            phone: payload.phone,
            id_number: payload.id_number,
            role_intent: payload.role_intent,
        },
    )
    .await?;

    Ok(Json(Envelope::ok(
        "Registration received. Your account is pending administrator approval.",
        AccountView::from(&account),
    )))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let account = match services::authenticate(&*state.store, &payload.email, &payload.password)
        .await
    {
        Ok(a) => a,
        Err(e) => {
            warn!(email = %payload.email, outcome = %e, "login refused");
            return Err(e.into());
        }
    };

    let keys = JwtKeys::from_config(&state.config.jwt);
    let access_token = keys.sign_access(account.id, account.tier)?;
    let refresh_token = keys.sign_refresh(account.id, account.tier)?;

    info!(account_id = %account.id, email = %account.email, "login successful");
    Ok(Json(Envelope::ok(
        "Login successful",
        AuthResponse {
            access_token,
            refresh_token,
            account: AccountView::from(&account),
        },
    )))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Envelope<AuthResponse>>, ApiError> {
    let keys = JwtKeys::from_config(&state.config.jwt);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let account = state
        .store
        .account_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("account no longer exists"))?;

    let access_token = keys.sign_access(account.id, account.tier)?;
    let refresh_token = keys.sign_refresh(account.id, account.tier)?;

    Ok(Json(Envelope::ok(
        "Token refreshed",
        AuthResponse {
            access_token,
            refresh_token,
            account: AccountView::from(&account),
        },
    )))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<AccountView>, ApiError> {
    let account = state
        .store
        .account_by_id(identity.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("account no longer exists"))?;
    Ok(Json(AccountView::from(&account)))
}
