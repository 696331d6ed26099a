use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractors::Identity;
use crate::error::StoreError;
use crate::store::{
    LifecycleStatus, Listing, ListingAttributes, ListingPatch, MarketStore,
};

const MIN_PLAUSIBLE_YEAR: i32 = 1900;

pub fn validate_attributes(attrs: &ListingAttributes) -> Result<(), StoreError> {
    for (label, value) in [
        ("brand", &attrs.brand),
        ("model", &attrs.model),
        ("description", &attrs.description),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{label} is required")));
        }
    }
    if attrs.price <= 0 {
        return Err(StoreError::Validation("price must be greater than zero".into()));
    }
    if attrs.mileage < 0 {
        return Err(StoreError::Validation("mileage cannot be negative".into()));
    }
    let max_year = OffsetDateTime::now_utc().year() + 1;
    if attrs.year < MIN_PLAUSIBLE_YEAR || attrs.year > max_year {
        return Err(StoreError::Validation(format!(
            "year must be between {MIN_PLAUSIBLE_YEAR} and {max_year}"
        )));
    }
    Ok(())
}

async fn fetch(store: &dyn MarketStore, id: Uuid) -> Result<Listing, StoreError> {
    store
        .listing_by_id(id)
        .await?
        .ok_or(StoreError::NotFound("listing"))
}

fn authorize(identity: &Identity, listing: &Listing) -> Result<(), StoreError> {
    if listing.owner_id == identity.id || identity.is_admin() {
        Ok(())
    } else {
        Err(StoreError::Forbidden)
    }
}

/// Create a listing in lifecycle `active`, sale status `draft`. The owner's
/// contact details are frozen into the record here and never re-synced.
pub async fn create(
    store: &dyn MarketStore,
    identity: &Identity,
    attrs: ListingAttributes,
    images: Vec<String>,
) -> Result<Listing, StoreError> {
    validate_attributes(&attrs)?;

    let owner = store
        .account_by_id(identity.id)
        .await?
        .ok_or(StoreError::NotFound("account"))?;

    let listing = Listing::new(&owner, attrs, images, OffsetDateTime::now_utc());
    let created = store.insert_listing(listing).await?;
    info!(listing_id = %created.id, owner_id = %created.owner_id, "listing created");
    Ok(created)
}

/// Merge a partial update into the listing. Only the owner or an admin may
/// mutate; unset fields are preserved; `updated_at` is refreshed.
pub async fn update(
    store: &dyn MarketStore,
    identity: &Identity,
    id: Uuid,
    patch: ListingPatch,
) -> Result<Listing, StoreError> {
    let mut listing = fetch(store, id).await?;
    authorize(identity, &listing)?;

    listing.apply(patch, OffsetDateTime::now_utc());
    validate_attributes(&listing.attributes())?;

    store.replace_listing(listing).await
}

/// Physical removal; there is no tombstone.
pub async fn delete(
    store: &dyn MarketStore,
    identity: &Identity,
    id: Uuid,
) -> Result<(), StoreError> {
    let listing = fetch(store, id).await?;
    authorize(identity, &listing)?;

    if !store.delete_listing(id).await? {
        return Err(StoreError::NotFound("listing"));
    }
    info!(listing_id = %id, "listing deleted");
    Ok(())
}

/// Every listing owned by the caller, any status. This is the owner's own
/// management view; it never serves other accounts.
pub async fn mine(
    store: &dyn MarketStore,
    identity: &Identity,
) -> Result<Vec<Listing>, StoreError> {
    store.listings_by_owner(identity.id).await
}

pub async fn by_id(
    store: &dyn MarketStore,
    identity: &Identity,
    id: Uuid,
) -> Result<Listing, StoreError> {
    let listing = fetch(store, id).await?;
    authorize(identity, &listing)?;
    Ok(listing)
}

/// Lifecycle transition: the vehicle is no longer for sale at all. Separate
/// axis from moderation; a sold listing leaves the catalog whatever its sale
/// status says.
pub async fn mark_sold(
    store: &dyn MarketStore,
    identity: &Identity,
    id: Uuid,
) -> Result<Listing, StoreError> {
    let mut listing = fetch(store, id).await?;
    authorize(identity, &listing)?;

    listing.lifecycle_status = LifecycleStatus::Sold;
    listing.updated_at = OffsetDateTime::now_utc();
    store.replace_listing(listing).await
}
