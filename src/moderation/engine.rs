use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractors::Identity;
use crate::error::StoreError;
use crate::store::{
    Account, AccountTier, Listing, MarketStore, SaleStatus, ValidationStatus,
};

// Listing sale-status machine:
//
//   draft --submit_for_sale--> pending_validation --approve--> approved
//                                                 --reject---> rejected
//
// `approved` and `rejected` are sinks: there is no transition back to
// `draft`, so a decided listing can only move again through admin action.
// The admin transitions are guarded strictly on `pending_validation`.

/// Owner hands the listing over for validation. Only legal from `draft`;
/// the failure message names the state the listing is actually in.
pub async fn submit_for_sale(
    store: &dyn MarketStore,
    actor: &Identity,
    listing_id: Uuid,
) -> Result<Listing, StoreError> {
    let mut listing = store
        .listing_by_id(listing_id)
        .await?
        .ok_or(StoreError::NotFound("listing"))?;

    if listing.owner_id != actor.id && !actor.is_admin() {
        return Err(StoreError::Forbidden);
    }
    if listing.sale_status != SaleStatus::Draft {
        return Err(StoreError::InvalidState(format!(
            "listing is already {}",
            listing.sale_status
        )));
    }

    listing.sale_status = SaleStatus::PendingValidation;
    listing.updated_at = OffsetDateTime::now_utc();

    let updated = store.replace_listing(listing).await?;
    info!(listing_id = %updated.id, "listing submitted for validation");
    Ok(updated)
}

fn require_pending(listing: &Listing) -> Result<(), StoreError> {
    if listing.sale_status != SaleStatus::PendingValidation {
        return Err(StoreError::InvalidState(format!(
            "listing is not awaiting validation (current status: {})",
            listing.sale_status
        )));
    }
    Ok(())
}

/// Admin approves a pending listing, making it eligible for the public
/// catalog (subject to its lifecycle status).
pub async fn approve_listing(
    store: &dyn MarketStore,
    admin_id: Uuid,
    listing_id: Uuid,
) -> Result<Listing, StoreError> {
    let mut listing = store
        .listing_by_id(listing_id)
        .await?
        .ok_or(StoreError::NotFound("listing"))?;
    require_pending(&listing)?;

    let now = OffsetDateTime::now_utc();
    listing.sale_status = SaleStatus::Approved;
    listing.rejection_reason = None;
    listing.validated_by = Some(admin_id);
    listing.validated_at = Some(now);
    listing.updated_at = now;

    let updated = store.replace_listing(listing).await?;
    info!(listing_id = %updated.id, admin_id = %admin_id, "listing approved");
    Ok(updated)
}

/// Admin rejects a pending listing. The reason is mandatory and is stored
/// verbatim so it can be surfaced to the owner as written.
pub async fn reject_listing(
    store: &dyn MarketStore,
    admin_id: Uuid,
    listing_id: Uuid,
    reason: &str,
) -> Result<Listing, StoreError> {
    if reason.trim().is_empty() {
        return Err(StoreError::Validation(
            "a rejection reason is required".into(),
        ));
    }

    let mut listing = store
        .listing_by_id(listing_id)
        .await?
        .ok_or(StoreError::NotFound("listing"))?;
    require_pending(&listing)?;

    let now = OffsetDateTime::now_utc();
    listing.sale_status = SaleStatus::Rejected;
    listing.rejection_reason = Some(reason.to_string());
    listing.validated_by = Some(admin_id);
    listing.validated_at = Some(now);
    listing.updated_at = now;

    let updated = store.replace_listing(listing).await?;
    info!(listing_id = %updated.id, admin_id = %admin_id, "listing rejected");
    Ok(updated)
}

// Account machine: pending -> approved | rejected, with permissive
// re-decision (an admin may flip a decided account either way). Admin-tier
// accounts never enter this machine.

async fn decidable_account(
    store: &dyn MarketStore,
    account_id: Uuid,
) -> Result<Account, StoreError> {
    let account = store
        .account_by_id(account_id)
        .await?
        .ok_or(StoreError::NotFound("account"))?;
    if account.tier == AccountTier::Admin {
        return Err(StoreError::InvalidState(
            "administrator accounts are not subject to approval".into(),
        ));
    }
    Ok(account)
}

/// Approving an account opens the login gate. It never touches the account's
/// listings: each one still needs its own validation.
pub async fn approve_account(
    store: &dyn MarketStore,
    admin_id: Uuid,
    account_id: Uuid,
) -> Result<Account, StoreError> {
    let mut account = decidable_account(store, account_id).await?;

    account.is_approved = true;
    account.validation_status = ValidationStatus::Approved;
    account.approved_by = Some(admin_id);
    account.approved_at = Some(OffsetDateTime::now_utc());

    let updated = store.replace_account(account).await?;
    info!(account_id = %updated.id, admin_id = %admin_id, "account approved");
    Ok(updated)
}

pub async fn reject_account(
    store: &dyn MarketStore,
    admin_id: Uuid,
    account_id: Uuid,
) -> Result<Account, StoreError> {
    let mut account = decidable_account(store, account_id).await?;

    account.is_approved = false;
    account.validation_status = ValidationStatus::Rejected;
    account.approved_by = Some(admin_id);
    account.approved_at = Some(OffsetDateTime::now_utc());

    let updated = store.replace_account(account).await?;
    info!(account_id = %updated.id, admin_id = %admin_id, "account rejected");
    Ok(updated)
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::accounts::services::{register, Registration};
    use crate::listings::services::create;
    use crate::store::{
        AccountStore, FuelType, ListingAttributes, ListingStore, LocalStore, RoleIntent,
        Transmission,
    };

    async fn seller(store: &LocalStore, email: &str) -> Identity {
        let account = register(
            store,
            Registration {
                email: email.into(),
                password: "hunter2hunter2".into(),
                full_name: "Juan Vendedor".into(),
                phone: "3001234567".into(),
                id_number: "1234567890".into(),
                role_intent: RoleIntent::Seller,
            },
        )
        .await
        .unwrap();
        Identity {
            id: account.id,
            tier: account.tier,
        }
    }

    fn attrs() -> ListingAttributes {
        ListingAttributes {
            brand: "Mazda".into(),
            model: "CX-5".into(),
            year: 2021,
            price: 120_000_000,
            description: "AWD, panoramic roof".into(),
            mileage: 28_000,
            transmission: Transmission::Automatic,
            fuel_type: FuelType::Gasoline,
        }
    }

    #[tokio::test]
    async fn draft_to_pending_to_approved() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;
        let admin_id = Uuid::new_v4();

        let listing = create(&store, &owner, attrs(), vec![]).await.unwrap();
        assert_eq!(listing.sale_status, SaleStatus::Draft);

        let pending = submit_for_sale(&store, &owner, listing.id).await.unwrap();
        assert_eq!(pending.sale_status, SaleStatus::PendingValidation);

        let approved = approve_listing(&store, admin_id, listing.id).await.unwrap();
        assert_eq!(approved.sale_status, SaleStatus::Approved);
        assert_eq!(approved.validated_by, Some(admin_id));
        assert!(approved.validated_at.is_some());
    }

    #[tokio::test]
    async fn submit_guard_names_current_state_and_leaves_record_unchanged() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;

        let listing = create(&store, &owner, attrs(), vec![]).await.unwrap();
        let pending = submit_for_sale(&store, &owner, listing.id).await.unwrap();

        let err = submit_for_sale(&store, &owner, listing.id).await.unwrap_err();
        match err {
            StoreError::InvalidState(msg) => assert!(msg.contains("pending_validation")),
            other => panic!("expected InvalidState, got {other:?}"),
        }

        let current = store.listing_by_id(listing.id).await.unwrap().unwrap();
        assert_eq!(current.sale_status, SaleStatus::PendingValidation);
        assert_eq!(current.version, pending.version);
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_submit() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;
        let stranger = seller(&store, "b@x.com").await;

        let listing = create(&store, &owner, attrs(), vec![]).await.unwrap();
        let err = submit_for_sale(&store, &stranger, listing.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
    }

    #[tokio::test]
    async fn admin_decisions_require_pending_validation() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;
        let admin_id = Uuid::new_v4();

        // Still a draft: neither decision is legal.
        let listing = create(&store, &owner, attrs(), vec![]).await.unwrap();
        assert!(matches!(
            approve_listing(&store, admin_id, listing.id).await.unwrap_err(),
            StoreError::InvalidState(_)
        ));
        assert!(matches!(
            reject_listing(&store, admin_id, listing.id, "blurry photos")
                .await
                .unwrap_err(),
            StoreError::InvalidState(_)
        ));

        // Once decided, the decision cannot be re-applied either.
        submit_for_sale(&store, &owner, listing.id).await.unwrap();
        approve_listing(&store, admin_id, listing.id).await.unwrap();
        assert!(matches!(
            approve_listing(&store, admin_id, listing.id).await.unwrap_err(),
            StoreError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn rejection_requires_a_reason_and_stores_it_verbatim() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;
        let admin_id = Uuid::new_v4();

        let listing = create(&store, &owner, attrs(), vec![]).await.unwrap();
        submit_for_sale(&store, &owner, listing.id).await.unwrap();

        for blank in ["", "   "] {
            let err = reject_listing(&store, admin_id, listing.id, blank)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        let current = store.listing_by_id(listing.id).await.unwrap().unwrap();
        assert_eq!(current.sale_status, SaleStatus::PendingValidation);

        let rejected = reject_listing(&store, admin_id, listing.id, "Fotos ilegibles")
            .await
            .unwrap();
        assert_eq!(rejected.sale_status, SaleStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Fotos ilegibles"));

        // No path back to draft: a rejected listing cannot be resubmitted.
        let err = submit_for_sale(&store, &owner, listing.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn account_decisions_can_be_flipped() {
        let store = LocalStore::ephemeral();
        let user = seller(&store, "a@x.com").await;
        let admin_id = Uuid::new_v4();

        let approved = approve_account(&store, admin_id, user.id).await.unwrap();
        assert!(approved.is_approved);
        assert_eq!(approved.validation_status, ValidationStatus::Approved);
        assert_eq!(approved.approved_by, Some(admin_id));

        let rejected = reject_account(&store, admin_id, user.id).await.unwrap();
        assert!(!rejected.is_approved);
        assert_eq!(rejected.validation_status, ValidationStatus::Rejected);

        let re_approved = approve_account(&store, admin_id, user.id).await.unwrap();
        assert!(re_approved.is_approved);
    }

    #[tokio::test]
    async fn admin_accounts_never_enter_the_machine() {
        let store = LocalStore::ephemeral();
        let admin = crate::store::Account::new_admin(
            "admin@autoplaza.test".into(),
            "hash".into(),
            crate::store::Profile {
                full_name: "Ana Administradora".into(),
                phone: "3109876543".into(),
                id_number: "ADM-002".into(),
            },
            OffsetDateTime::now_utc(),
        );
        let admin = store.insert_account(admin).await.unwrap();

        let err = reject_account(&store, Uuid::new_v4(), admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn approving_an_account_never_touches_its_listings() {
        let store = LocalStore::ephemeral();
        let owner = seller(&store, "a@x.com").await;
        let admin_id = Uuid::new_v4();

        let draft = create(&store, &owner, attrs(), vec![]).await.unwrap();
        let submitted = create(&store, &owner, attrs(), vec![]).await.unwrap();
        submit_for_sale(&store, &owner, submitted.id).await.unwrap();

        approve_account(&store, admin_id, owner.id).await.unwrap();

        let draft_now = store.listing_by_id(draft.id).await.unwrap().unwrap();
        let submitted_now = store.listing_by_id(submitted.id).await.unwrap().unwrap();
        assert_eq!(draft_now.sale_status, SaleStatus::Draft);
        assert_eq!(submitted_now.sale_status, SaleStatus::PendingValidation);
        assert!(store.public_catalog().await.unwrap().is_empty());
    }
}
