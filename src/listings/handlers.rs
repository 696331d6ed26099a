use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthIdentity,
    error::ApiError,
    images,
    listings::dto::{CreateListingRequest, UpdateListingRequest},
    moderation::engine,
    response::Envelope,
    state::AppState,
    store::{Listing, ListingPatch},
};

use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create_listing))
        .route("/listings/mine", get(my_listings))
        .route(
            "/listings/:id",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .route("/listings/:id/submit", post(submit_for_sale))
        .route("/listings/:id/sold", post(mark_sold))
}

#[instrument(skip(state, payload))]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(payload): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Envelope<Listing>>), ApiError> {
    let (attrs, uploads) = payload.into_parts();
    let image_refs = images::encode_all(&uploads)?;

    let listing = services::create(&*state.store, &identity, attrs, image_refs).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Listing created as a draft", listing)),
    ))
}

#[instrument(skip(state))]
pub async fn my_listings(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(services::mine(&*state.store, &identity).await?))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    Ok(Json(services::by_id(&*state.store, &identity, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_listing(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
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

    let listing = services::update(&*state.store, &identity, id, patch).await?;
    Ok(Json(Envelope::ok("Listing updated", listing)))
}

#[instrument(skip(state))]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<()>>, ApiError> {
    services::delete(&*state.store, &identity, id).await?;
    Ok(Json(Envelope::message_only("Listing deleted")))
}

#[instrument(skip(state))]
pub async fn submit_for_sale(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
    let listing = engine::submit_for_sale(&*state.store, &identity, id).await?;
    Ok(Json(Envelope::ok(
        "Listing submitted for validation",
        listing,
    )))
}

#[instrument(skip(state))]
pub async fn mark_sold(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
    let listing = services::mark_sold(&*state.store, &identity, id).await?;
    Ok(Json(Envelope::ok("Listing marked as sold", listing)))
}
