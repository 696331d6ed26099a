use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthIdentity,
    error::ApiError,
    images,
    response::Envelope,
    state::AppState,
    store::{DraftListing, Listing, ListingPatch},
};

use super::dto::{CreateDraftRequest, UpdateDraftRequest};
use super::services;

/// Caller-supplied anonymous session id, carried in a header. Explicit
/// per-request context; nothing is remembered server-side between calls.
pub struct SessionId(pub String);

const SESSION_HEADER: &str = "x-session-id";

#[async_trait]
impl FromRequestParts<AppState> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("missing {SESSION_HEADER} header"),
                )
            })?;
        Ok(SessionId(value.to_string()))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drafts", post(create_draft).get(my_drafts))
        .route(
            "/drafts/:id",
            put(update_draft).delete(delete_draft),
        )
        .route("/drafts/:id/convert", post(convert_draft))
}

#[instrument(skip(state, payload))]
pub async fn create_draft(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(payload): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<Envelope<DraftListing>>), ApiError> {
    let image_refs = images::encode_all(&payload.images)?;
    let attrs = payload.attributes();

    let draft = services::create(
        &*state.store,
        session_id,
        payload.contact_name,
        payload.contact_email,
        payload.contact_phone,
        attrs,
        image_refs,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "Listing staged. You can claim it after registering an account.",
            draft,
        )),
    ))
}

#[instrument(skip(state))]
pub async fn my_drafts(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Result<Json<Vec<DraftListing>>, ApiError> {
    Ok(Json(services::by_session(&*state.store, &session_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_draft(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDraftRequest>,
) -> Result<Json<Envelope<DraftListing>>, ApiError> {
    let image_refs = match &payload.images {
        Some(uploads) => Some(images::encode_all(uploads)?),
        None => None,
    };
    let patch = ListingPatch {
        brand: payload.brand,
        model: payload.model,
        year: payload.year,
        price: payload.price,
        description: payload.description,
        mileage: payload.mileage,
        transmission: payload.transmission,
        fuel_type: payload.fuel_type,
        images: image_refs,
    };

    let draft = services::update(&*state.store, &session_id, id, patch).await?;
    Ok(Json(Envelope::ok("Staged listing updated", draft)))
}

#[instrument(skip(state))]
pub async fn delete_draft(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<()>>, ApiError> {
    services::delete(&*state.store, &session_id, id).await?;
    Ok(Json(Envelope::message_only("Staged listing deleted")))
}

#[instrument(skip(state))]
pub async fn convert_draft(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
    let listing = services::convert(&*state.store, &identity, id).await?;
    Ok(Json(Envelope::ok("Staged listing converted", listing)))
}
