use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractors::Identity;
use crate::error::StoreError;
use crate::listings::services::validate_attributes;
use crate::store::{
    DraftListing, DraftStatus, Listing, ListingAttributes, ListingPatch, MarketStore,
};

/// Stage a listing for an unauthenticated visitor. The session id stands in
/// for an owner until the visitor registers and converts it.
pub async fn create(
    store: &dyn MarketStore,
    session_id: String,
    contact_name: String,
    contact_email: String,
    contact_phone: String,
    attrs: ListingAttributes,
    images: Vec<String>,
) -> Result<DraftListing, StoreError> {
    validate_attributes(&attrs)?;
    for (label, value) in [
        ("contact name", &contact_name),
        ("contact email", &contact_email),
        ("contact phone", &contact_phone),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{label} is required")));
        }
    }

    let draft = DraftListing::new(
        session_id,
        contact_name,
        contact_email,
        contact_phone,
        attrs,
        images,
        OffsetDateTime::now_utc(),
    );
    let created = store.insert_draft(draft).await?;
    info!(draft_id = %created.id, "listing staged");
    Ok(created)
}

async fn owned_by_session(
    store: &dyn MarketStore,
    session_id: &str,
    id: Uuid,
) -> Result<DraftListing, StoreError> {
    let draft = store
        .draft_by_id(id)
        .await?
        .ok_or(StoreError::NotFound("staged listing"))?;
    if draft.session_id != session_id {
        return Err(StoreError::Forbidden);
    }
    Ok(draft)
}

pub async fn update(
    store: &dyn MarketStore,
    session_id: &str,
    id: Uuid,
    patch: ListingPatch,
) -> Result<DraftListing, StoreError> {
    let mut draft = owned_by_session(store, session_id, id).await?;
    if draft.status != DraftStatus::Temporary {
        return Err(StoreError::InvalidState(format!(
            "staged listing is already {}",
            draft.status
        )));
    }

    draft.apply(patch, OffsetDateTime::now_utc());
    validate_attributes(&draft.attributes())?;
    store.replace_draft(draft).await
}

pub async fn delete(
    store: &dyn MarketStore,
    session_id: &str,
    id: Uuid,
) -> Result<(), StoreError> {
    owned_by_session(store, session_id, id).await?;
    if !store.delete_draft(id).await? {
        return Err(StoreError::NotFound("staged listing"));
    }
    Ok(())
}

pub async fn by_session(
    store: &dyn MarketStore,
    session_id: &str,
) -> Result<Vec<DraftListing>, StoreError> {
    store.drafts_by_session(session_id).await
}

/// Turn a staged listing into an owned one. The new listing starts as an
/// `active` draft, snapshots the converting account's contact details, and
/// inherits the staging creation time.
pub async fn convert(
    store: &dyn MarketStore,
    identity: &Identity,
    draft_id: Uuid,
) -> Result<Listing, StoreError> {
    let mut draft = store
        .draft_by_id(draft_id)
        .await?
        .ok_or(StoreError::NotFound("staged listing"))?;
    if draft.status != DraftStatus::Temporary {
        return Err(StoreError::InvalidState(format!(
            "staged listing is already {}",
            draft.status
        )));
    }

    let owner = store
        .account_by_id(identity.id)
        .await?
        .ok_or(StoreError::NotFound("account"))?;

    let now = OffsetDateTime::now_utc();
    let mut listing = Listing::new(&owner, draft.attributes(), draft.images.clone(), now);
    listing.created_at = draft.created_at;

    let listing = store.insert_listing(listing).await?;

    draft.status = DraftStatus::Converted;
    draft.updated_at = now;
    store.replace_draft(draft).await?;

    info!(draft_id = %draft_id, listing_id = %listing.id, "staged listing converted");
    Ok(listing)
}
