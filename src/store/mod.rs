use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

pub mod local;
pub mod postgres;
pub mod types;

pub use local::LocalStore;
pub use postgres::PgStore;
pub use types::{
    Account, AccountTier, CatalogFilter, DraftListing, DraftStatus, FuelType, LifecycleStatus,
    Listing, ListingAttributes, ListingPatch, Profile, RoleIntent, SaleStatus, Transmission,
    ValidationStatus,
};

/// Durable storage of account records. `replace_account` is a whole-record
/// compare-and-swap on the version the caller read; partial updates are
/// merged by the service layer before the write.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError>;
    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn replace_account(&self, account: Account) -> Result<Account, StoreError>;
    /// User-tier accounts still awaiting a decision, most recent first.
    async fn pending_accounts(&self) -> Result<Vec<Account>, StoreError>;
    async fn all_accounts(&self) -> Result<Vec<Account>, StoreError>;
}

/// Durable storage of vehicle listings plus the catalog projections.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError>;
    async fn listing_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;
    async fn listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError>;
    async fn replace_listing(&self, listing: Listing) -> Result<Listing, StoreError>;
    /// Physical removal; returns whether a record existed.
    async fn delete_listing(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn all_listings(&self) -> Result<Vec<Listing>, StoreError>;
    async fn pending_listings(&self) -> Result<Vec<Listing>, StoreError>;
    /// Listings with lifecycle `active` and sale status `approved`,
    /// newest-created first.
    async fn public_catalog(&self) -> Result<Vec<Listing>, StoreError>;
    /// Same base predicate and order as `public_catalog`, intersected with
    /// the filter.
    async fn search_catalog(&self, filter: &CatalogFilter) -> Result<Vec<Listing>, StoreError>;
}

/// Storage of anonymous staged listings keyed by session id.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn insert_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError>;
    async fn draft_by_id(&self, id: Uuid) -> Result<Option<DraftListing>, StoreError>;
    async fn drafts_by_session(&self, session_id: &str)
        -> Result<Vec<DraftListing>, StoreError>;
    async fn replace_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError>;
    async fn delete_draft(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Remove staged listings created before the cutoff; returns the count.
    async fn purge_stale_drafts(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError>;
}

/// The full persistence contract. Two interchangeable backends implement it:
/// `PgStore` (remote relational) and `LocalStore` (per-installation JSON).
pub trait MarketStore: AccountStore + ListingStore + DraftStore {}

impl<T: AccountStore + ListingStore + DraftStore> MarketStore for T {}
