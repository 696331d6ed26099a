use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::error::StoreError;

use super::types::{Account, CatalogFilter, DraftListing, Listing};
use super::{AccountStore, DraftStore, ListingStore};

const ACCOUNT_COLUMNS: &str = "id, email, secret_hash, full_name, phone, id_number, role_intent, \
     tier, validation_status, is_approved, approved_by, approved_at, created_at, version";

const LISTING_COLUMNS: &str = "id, owner_id, owner_email, owner_name, owner_phone, brand, model, \
     year, price, description, mileage, transmission, fuel_type, images, lifecycle_status, \
     sale_status, rejection_reason, validated_by, validated_at, created_at, updated_at, version";

const DRAFT_COLUMNS: &str = "id, session_id, contact_name, contact_email, contact_phone, brand, \
     model, year, price, description, mileage, transmission, fuel_type, images, status, \
     created_at, updated_at, version";

/// Remote relational backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            warn!(error = %e, "migration failed; continuing with existing schema");
        }

        Ok(Self { pool })
    }
}

fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(&account.email)
            .bind(&account.secret_hash)
            .bind(&account.full_name)
            .bind(&account.phone)
            .bind(&account.id_number)
            .bind(account.role_intent)
            .bind(account.tier)
            .bind(account.validation_status)
            .bind(account.is_approved)
            .bind(account.approved_by)
            .bind(account.approved_at)
            .bind(account.created_at)
            .bind(account.version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "accounts_email_key") {
                    StoreError::DuplicateEmail
                } else {
                    e.into()
                }
            })?;
        Ok(inserted)
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        Ok(sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        // Case-sensitive exact match, mirroring the reference store.
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        Ok(sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn replace_account(&self, account: Account) -> Result<Account, StoreError> {
        let sql = format!(
            "UPDATE accounts SET \
                email = $2, secret_hash = $3, full_name = $4, phone = $5, id_number = $6, \
                role_intent = $7, tier = $8, validation_status = $9, is_approved = $10, \
                approved_by = $11, approved_at = $12, version = version + 1 \
             WHERE id = $1 AND version = $13 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(&account.email)
            .bind(&account.secret_hash)
            .bind(&account.full_name)
            .bind(&account.phone)
            .bind(&account.id_number)
            .bind(account.role_intent)
            .bind(account.tier)
            .bind(account.validation_status)
            .bind(account.is_approved)
            .bind(account.approved_by)
            .bind(account.approved_at)
            .bind(account.version)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(a) => Ok(a),
            None => {
                if self.account_by_id(account.id).await?.is_some() {
                    Err(StoreError::Conflict)
                } else {
                    Err(StoreError::NotFound("account"))
                }
            }
        }
    }

    async fn pending_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE tier = 'user' AND is_approved = FALSE \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let sql = format!(
            "INSERT INTO listings ({LISTING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21, $22) \
             RETURNING {LISTING_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(listing.id)
            .bind(listing.owner_id)
            .bind(&listing.owner_email)
            .bind(&listing.owner_name)
            .bind(&listing.owner_phone)
            .bind(&listing.brand)
            .bind(&listing.model)
            .bind(listing.year)
            .bind(listing.price)
            .bind(&listing.description)
            .bind(listing.mileage)
            .bind(listing.transmission)
            .bind(listing.fuel_type)
            .bind(&listing.images)
            .bind(listing.lifecycle_status)
            .bind(listing.sale_status)
            .bind(&listing.rejection_reason)
            .bind(listing.validated_by)
            .bind(listing.validated_at)
            .bind(listing.created_at)
            .bind(listing.updated_at)
            .bind(listing.version)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn listing_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn replace_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let sql = format!(
            "UPDATE listings SET \
                owner_email = $2, owner_name = $3, owner_phone = $4, brand = $5, model = $6, \
                year = $7, price = $8, description = $9, mileage = $10, transmission = $11, \
                fuel_type = $12, images = $13, lifecycle_status = $14, sale_status = $15, \
                rejection_reason = $16, validated_by = $17, validated_at = $18, \
                updated_at = $19, version = version + 1 \
             WHERE id = $1 AND version = $20 \
             RETURNING {LISTING_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Listing>(&sql)
            .bind(listing.id)
            .bind(&listing.owner_email)
            .bind(&listing.owner_name)
            .bind(&listing.owner_phone)
            .bind(&listing.brand)
            .bind(&listing.model)
            .bind(listing.year)
            .bind(listing.price)
            .bind(&listing.description)
            .bind(listing.mileage)
            .bind(listing.transmission)
            .bind(listing.fuel_type)
            .bind(&listing.images)
            .bind(listing.lifecycle_status)
            .bind(listing.sale_status)
            .bind(&listing.rejection_reason)
            .bind(listing.validated_by)
            .bind(listing.validated_at)
            .bind(listing.updated_at)
            .bind(listing.version)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(l) => Ok(l),
            None => {
                if self.listing_by_id(listing.id).await?.is_some() {
                    Err(StoreError::Conflict)
                } else {
                    Err(StoreError::NotFound("listing"))
                }
            }
        }
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn all_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn pending_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE sale_status = 'pending_validation' \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn public_catalog(&self) -> Result<Vec<Listing>, StoreError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE lifecycle_status = 'active' AND sale_status = 'approved' \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_catalog(&self, filter: &CatalogFilter) -> Result<Vec<Listing>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE lifecycle_status = 'active' AND sale_status = 'approved'"
        ));
        if let Some(brand) = &filter.brand {
            qb.push(" AND brand ILIKE ");
            qb.push_bind(format!("%{brand}%"));
        }
        if let Some(model) = &filter.model {
            qb.push(" AND model ILIKE ");
            qb.push_bind(format!("%{model}%"));
        }
        if let Some(min_year) = filter.min_year {
            qb.push(" AND year >= ");
            qb.push_bind(min_year);
        }
        if let Some(max_year) = filter.max_year {
            qb.push(" AND year <= ");
            qb.push_bind(max_year);
        }
        if let Some(min_price) = filter.min_price {
            qb.push(" AND price >= ");
            qb.push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            qb.push(" AND price <= ");
            qb.push_bind(max_price);
        }
        if let Some(transmission) = filter.transmission {
            qb.push(" AND transmission = ");
            qb.push_bind(transmission);
        }
        if let Some(fuel_type) = filter.fuel_type {
            qb.push(" AND fuel_type = ");
            qb.push_bind(fuel_type);
        }
        qb.push(" ORDER BY created_at DESC");

        Ok(qb
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl DraftStore for PgStore {
    async fn insert_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError> {
        let sql = format!(
            "INSERT INTO draft_listings ({DRAFT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18) \
             RETURNING {DRAFT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, DraftListing>(&sql)
            .bind(draft.id)
            .bind(&draft.session_id)
            .bind(&draft.contact_name)
            .bind(&draft.contact_email)
            .bind(&draft.contact_phone)
            .bind(&draft.brand)
            .bind(&draft.model)
            .bind(draft.year)
            .bind(draft.price)
            .bind(&draft.description)
            .bind(draft.mileage)
            .bind(draft.transmission)
            .bind(draft.fuel_type)
            .bind(&draft.images)
            .bind(draft.status)
            .bind(draft.created_at)
            .bind(draft.updated_at)
            .bind(draft.version)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn draft_by_id(&self, id: Uuid) -> Result<Option<DraftListing>, StoreError> {
        let sql = format!("SELECT {DRAFT_COLUMNS} FROM draft_listings WHERE id = $1");
        Ok(sqlx::query_as::<_, DraftListing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn drafts_by_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<DraftListing>, StoreError> {
        let sql = format!(
            "SELECT {DRAFT_COLUMNS} FROM draft_listings \
             WHERE session_id = $1 AND status = 'temporary' \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, DraftListing>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn replace_draft(&self, draft: DraftListing) -> Result<DraftListing, StoreError> {
        let sql = format!(
            "UPDATE draft_listings SET \
                contact_name = $2, contact_email = $3, contact_phone = $4, brand = $5, \
                model = $6, year = $7, price = $8, description = $9, mileage = $10, \
                transmission = $11, fuel_type = $12, images = $13, status = $14, \
                updated_at = $15, version = version + 1 \
             WHERE id = $1 AND version = $16 \
             RETURNING {DRAFT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, DraftListing>(&sql)
            .bind(draft.id)
            .bind(&draft.contact_name)
            .bind(&draft.contact_email)
            .bind(&draft.contact_phone)
            .bind(&draft.brand)
            .bind(&draft.model)
            .bind(draft.year)
            .bind(draft.price)
            .bind(&draft.description)
            .bind(draft.mileage)
            .bind(draft.transmission)
            .bind(draft.fuel_type)
            .bind(&draft.images)
            .bind(draft.status)
            .bind(draft.updated_at)
            .bind(draft.version)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(d) => Ok(d),
            None => {
                if self.draft_by_id(draft.id).await?.is_some() {
                    Err(StoreError::Conflict)
                } else {
                    Err(StoreError::NotFound("staged listing"))
                }
            }
        }
    }

    async fn delete_draft(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM draft_listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_stale_drafts(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM draft_listings WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
