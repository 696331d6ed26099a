use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;

use super::types::{
    Account, AccountTier, CatalogFilter, DraftListing, Listing,
};
use super::{AccountStore, DraftStore, ListingStore};

/// Local backend: the whole record set lives in process and is written back
/// to a single JSON snapshot after every mutation, the way the reference
/// per-browser store reads and rewrites its full collections. Optimistic
/// versioning on `replace_*` guards against lost updates.
pub struct LocalStore {
    inner: RwLock<Collections>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    accounts: HashMap<Uuid, Account>,
    listings: HashMap<Uuid, Listing>,
    drafts: HashMap<Uuid, DraftListing>,
}

impl LocalStore {
    /// In-memory only; nothing survives the process. Used by tests and as
    /// the default when no snapshot path is configured.
    pub fn ephemeral() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            snapshot_path: None,
        }
    }

    /// Open (or create) a snapshot-backed store at `path`.
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse snapshot {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::default(),
            Err(e) => return Err(e).with_context(|| format!("read snapshot {}", path.display())),
        };
        info!(path = %path.display(), "local store opened");
        Ok(Self {
            inner: RwLock::new(collections),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, data: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(data)
            .context("serialize snapshot")
            .map_err(StoreError::Backend)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("create snapshot directory")
                .map_err(StoreError::Backend)?;
        }
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("write snapshot {}", path.display()))
            .map_err(StoreError::Backend)?;
        Ok(())
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> OffsetDateTime,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl AccountStore for LocalStore {
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut data = self.inner.write().await;
        if data.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        data.accounts.insert(account.id, account.clone());
        self.persist(&data).await?;
        Ok(account)
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        // Exact, case-sensitive match, as the reference store does it.
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn replace_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut data = self.inner.write().await;
        let stored = data
            .accounts
            .get(&account.id)
            .ok_or(StoreError::NotFound("account"))?;
        if stored.version != account.version {
            return Err(StoreError::Conflict);
        }
        let mut updated = account;
        updated.version += 1;
        data.accounts.insert(updated.id, updated.clone());
        self.persist(&data).await?;
        Ok(updated)
    }

    async fn pending_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let data = self.inner.read().await;
        let pending = data
            .accounts
            .values()
            .filter(|a| a.tier == AccountTier::User && !a.is_approved)
            .cloned()
            .collect();
        Ok(newest_first(pending, |a| a.created_at))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let data = self.inner.read().await;
        Ok(newest_first(
            data.accounts.values().cloned().collect(),
            |a| a.created_at,
        ))
    }
}

#[async_trait]
impl ListingStore for LocalStore {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let mut data = self.inner.write().await;
        data.listings.insert(listing.id, listing.clone());
        self.persist(&data).await?;
        Ok(listing)
    }

    async fn listing_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        Ok(self.inner.read().await.listings.get(&id).cloned())
    }

    async fn listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let data = self.inner.read().await;
        let mine = data
            .listings
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(mine, |l| l.created_at))
    }

    async fn replace_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let mut data = self.inner.write().await;
        let stored = data
            .listings
            .get(&listing.id)
            .ok_or(StoreError::NotFound("listing"))?;
        if stored.version != listing.version {
            return Err(StoreError::Conflict);
        }
        let mut updated = listing;
        updated.version += 1;
        data.listings.insert(updated.id, updated.clone());
        self.persist(&data).await?;
        Ok(updated)
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut data = self.inner.write().await;
        let removed = data.listings.remove(&id).is_some();
        if removed {
            self.persist(&data).await?;
        }
        Ok(removed)
    }

    async fn all_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let data = self.inner.read().await;
        Ok(newest_first(
            data.listings.values().cloned().collect(),
            |l| l.created_at,
        ))
    }

    async fn pending_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let data = self.inner.read().await;
        let pending = data
            .listings
            .values()
            .filter(|l| l.sale_status == super::SaleStatus::PendingValidation)
            .cloned()
            .collect();
        Ok(newest_first(pending, |l| l.created_at))
    }

    async fn public_catalog(&self) -> Result<Vec<Listing>, StoreError> {
        let data = self.inner.read().await;
        let visible = data
            .listings
            .values()
            .filter(|l| l.publicly_visible())
            .cloned()
            .collect();
        Ok(newest_first(visible, |l| l.created_at))
    }

    async fn search_catalog(&self, filter: &CatalogFilter) -> Result<Vec<Listing>, StoreError> {
        let data = self.inner.read().await;
        let hits = data
            .listings
            .values()
            .filter(|l| l.publicly_visible() && filter.matches(l))
            .cloned()
            .collect();
        Ok(newest_first(hits, |l| l.created_at))
    }
}

#[async_trait]
impl DraftStore for LocalStore {
    async fn insert_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError> {
        let mut data = self.inner.write().await;
        data.drafts.insert(draft.id, draft.clone());
        self.persist(&data).await?;
        Ok(draft)
    }

    async fn draft_by_id(&self, id: Uuid) -> Result<Option<DraftListing>, StoreError> {
        Ok(self.inner.read().await.drafts.get(&id).cloned())
    }

    async fn drafts_by_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<DraftListing>, StoreError> {
        let data = self.inner.read().await;
        let mine = data
            .drafts
            .values()
            .filter(|d| d.session_id == session_id && d.status == super::DraftStatus::Temporary)
            .cloned()
            .collect();
        Ok(newest_first(mine, |d| d.created_at))
    }

    async fn replace_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError> {
        let mut data = self.inner.write().await;
        let stored = data
            .drafts
            .get(&draft.id)
            .ok_or(StoreError::NotFound("staged listing"))?;
        if stored.version != draft.version {
            return Err(StoreError::Conflict);
        }
        let mut updated = draft;
        updated.version += 1;
        data.drafts.insert(updated.id, updated.clone());
        self.persist(&data).await?;
        Ok(updated)
    }

    async fn delete_draft(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut data = self.inner.write().await;
        let removed = data.drafts.remove(&id).is_some();
        if removed {
            self.persist(&data).await?;
        }
        Ok(removed)
    }

    async fn purge_stale_drafts(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError> {
        let mut data = self.inner.write().await;
        let before = data.drafts.len();
        data.drafts.retain(|_, d| d.created_at >= cutoff);
        let removed = (before - data.drafts.len()) as u64;
        if removed > 0 {
            self.persist(&data).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod local_store_tests {
    use super::super::types::{ListingAttributes, Profile, RoleIntent};
    use super::*;
    use crate::store::{FuelType, Transmission};

    fn account(email: &str) -> Account {
        Account::new_user(
            email.into(),
            "hash".into(),
            Profile {
                full_name: "Test".into(),
                phone: "3000000000".into(),
                id_number: "1".into(),
            },
            RoleIntent::Seller,
            OffsetDateTime::now_utc(),
        )
    }

    fn listing(owner: &Account) -> Listing {
        Listing::new(
            owner,
            ListingAttributes {
                brand: "Toyota".into(),
                model: "Corolla".into(),
                year: 2020,
                price: 85_000_000,
                description: "clean".into(),
                mileage: 45_000,
                transmission: Transmission::Automatic,
                fuel_type: FuelType::Gasoline,
            },
            vec![],
            OffsetDateTime::now_utc(),
        )
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = LocalStore::ephemeral();
        store.insert_account(account("a@x.com")).await.unwrap();
        let err = store.insert_account(account("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = LocalStore::ephemeral();
        store.insert_account(account("a@x.com")).await.unwrap();
        assert!(store.account_by_email("A@x.com").await.unwrap().is_none());
        assert!(store.account_by_email("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn replace_bumps_version_and_detects_conflicts() {
        let store = LocalStore::ephemeral();
        let owner = store.insert_account(account("a@x.com")).await.unwrap();
        let stored = store.insert_listing(listing(&owner)).await.unwrap();
        assert_eq!(stored.version, 1);

        let mut first = stored.clone();
        first.price = 80_000_000;
        let updated = store.replace_listing(first).await.unwrap();
        assert_eq!(updated.version, 2);

        // A writer still holding version 1 loses.
        let mut stale = stored;
        stale.price = 70_000_000;
        let err = store.replace_listing(stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let current = store.listing_by_id(updated.id).await.unwrap().unwrap();
        assert_eq!(current.price, 80_000_000);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let store = LocalStore::ephemeral();
        assert!(!store.delete_listing(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_older_drafts() {
        let store = LocalStore::ephemeral();
        let now = OffsetDateTime::now_utc();
        let attrs = ListingAttributes {
            brand: "Renault".into(),
            model: "Duster".into(),
            year: 2022,
            price: 95_000_000,
            description: "4x4".into(),
            mileage: 15_000,
            transmission: Transmission::Automatic,
            fuel_type: FuelType::Gasoline,
        };
        let mut old = DraftListing::new(
            "s1".into(),
            "Ana".into(),
            "ana@x.com".into(),
            "311".into(),
            attrs.clone(),
            vec![],
            now,
        );
        old.created_at = now - time::Duration::days(60);
        store.insert_draft(old).await.unwrap();
        store
            .insert_draft(DraftListing::new(
                "s1".into(),
                "Ana".into(),
                "ana@x.com".into(),
                "311".into(),
                attrs,
                vec![],
                now,
            ))
            .await
            .unwrap();

        let removed = store
            .purge_stale_drafts(now - time::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.drafts_by_session("s1").await.unwrap().len(), 1);
    }
}
