use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    accounts::{dto::AccountView, services as accounts},
    auth::extractors::AdminIdentity,
    error::ApiError,
    response::Envelope,
    state::AppState,
    store::Listing,
};

use super::dto::{PurgeQuery, RejectRequest};
use super::engine;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/accounts", get(list_accounts))
        .route("/admin/accounts/pending", get(pending_accounts))
        .route("/admin/accounts/:id/approve", post(approve_account))
        .route("/admin/accounts/:id/reject", post(reject_account))
        .route("/admin/listings", get(list_listings))
        .route("/admin/listings/pending", get(pending_listings))
        .route("/admin/listings/:id/approve", post(approve_listing))
        .route("/admin/listings/:id/reject", post(reject_listing))
        .route("/admin/drafts/purge", post(purge_drafts))
}

#[instrument(skip(state))]
pub async fn list_accounts(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Result<Json<Vec<AccountView>>, ApiError> {
    let accounts = accounts::all_accounts(&*state.store).await?;
    Ok(Json(accounts.iter().map(AccountView::from).collect()))
}

#[instrument(skip(state))]
pub async fn pending_accounts(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Result<Json<Vec<AccountView>>, ApiError> {
    let accounts = accounts::pending_accounts(&*state.store).await?;
    Ok(Json(accounts.iter().map(AccountView::from).collect()))
}

#[instrument(skip(state))]
pub async fn approve_account(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<AccountView>>, ApiError> {
    let account = engine::approve_account(&*state.store, admin.id, id).await?;
    Ok(Json(Envelope::ok(
        "Account approved",
        AccountView::from(&account),
    )))
}

#[instrument(skip(state))]
pub async fn reject_account(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<AccountView>>, ApiError> {
    let account = engine::reject_account(&*state.store, admin.id, id).await?;
    Ok(Json(Envelope::ok(
        "Account rejected",
        AccountView::from(&account),
    )))
}

#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.store.all_listings().await?))
}

#[instrument(skip(state))]
pub async fn pending_listings(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.store.pending_listings().await?))
}

#[instrument(skip(state))]
pub async fn approve_listing(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
    let listing = engine::approve_listing(&*state.store, admin.id, id).await?;
    Ok(Json(Envelope::ok(
        "Listing approved and now visible in the public catalog",
        listing,
    )))
}

#[instrument(skip(state, payload))]
pub async fn reject_listing(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<Envelope<Listing>>, ApiError> {
    let listing =
        engine::reject_listing(&*state.store, admin.id, id, &payload.reason).await?;
    Ok(Json(Envelope::ok("Listing rejected", listing)))
}

#[instrument(skip(state))]
pub async fn purge_drafts(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<Envelope<u64>>, ApiError> {
    let cutoff = OffsetDateTime::now_utc() - Duration::days(query.days.max(0));
    let removed = state.store.purge_stale_drafts(cutoff).await?;
    info!(removed, days = query.days, "stale staged listings purged");
    Ok(Json(Envelope::ok(
        format!("Purged {removed} stale staged listings"),
        removed,
    )))
}
