use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AccountTier {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RoleIntent {
    Buyer,
    Seller,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Sold,
    Inactive,
}

/// Moderation state of a listing. There is no transition back to `Draft`:
/// `Approved` and `Rejected` are sinks reachable only through admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SaleStatus {
    Draft,
    PendingValidation,
    Approved,
    Rejected,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::PendingValidation => "pending_validation",
            SaleStatus::Approved => "approved",
            SaleStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Transmission {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Electric,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DraftStatus {
    Temporary,
    Converted,
    Expired,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Temporary => "temporary",
            DraftStatus::Converted => "converted",
            DraftStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marketplace account. Admin-tier accounts are provisioned directly in the
/// approved state; user-tier accounts start pending and are gated by the
/// moderation engine. Never serialized to clients as-is — see `AccountView`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub secret_hash: String,
    pub full_name: String,
    pub phone: String,
    pub id_number: String,
    pub role_intent: RoleIntent,
    pub tier: AccountTier,
    pub validation_status: ValidationStatus,
    pub is_approved: bool,
    pub approved_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

/// Profile fields supplied at registration.
#[derive(Debug, Clone)]
pub struct Profile {
    pub full_name: String,
    pub phone: String,
    pub id_number: String,
}

impl Account {
    pub fn new_user(
        email: String,
        secret_hash: String,
        profile: Profile,
        role_intent: RoleIntent,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            secret_hash,
            full_name: profile.full_name,
            phone: profile.phone,
            id_number: profile.id_number,
            role_intent,
            tier: AccountTier::User,
            validation_status: ValidationStatus::Pending,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            created_at: now,
            version: 1,
        }
    }

    /// Admin accounts bypass the approval gate entirely: provisioned approved,
    /// never created through the registration path.
    pub fn new_admin(
        email: String,
        secret_hash: String,
        profile: Profile,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            secret_hash,
            full_name: profile.full_name,
            phone: profile.phone,
            id_number: profile.id_number,
            role_intent: RoleIntent::Both,
            tier: AccountTier::Admin,
            validation_status: ValidationStatus::Approved,
            is_approved: true,
            approved_by: None,
            approved_at: None,
            created_at: now,
            version: 1,
        }
    }
}

/// Descriptive attributes shared by owned listings and anonymous staged ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingAttributes {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub description: String,
    pub mileage: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
}

/// A vehicle listing. Owner contact fields are a snapshot frozen at creation
/// time and are not re-synced when the owner's profile changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub description: String,
    pub mileage: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub images: Vec<String>,
    pub lifecycle_status: LifecycleStatus,
    pub sale_status: SaleStatus,
    pub rejection_reason: Option<String>,
    pub validated_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub validated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub version: i64,
}

impl Listing {
    pub fn new(
        owner: &Account,
        attrs: ListingAttributes,
        images: Vec<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            owner_email: owner.email.clone(),
            owner_name: owner.full_name.clone(),
            owner_phone: owner.phone.clone(),
            brand: attrs.brand,
            model: attrs.model,
            year: attrs.year,
            price: attrs.price,
            description: attrs.description,
            mileage: attrs.mileage,
            transmission: attrs.transmission,
            fuel_type: attrs.fuel_type,
            images,
            lifecycle_status: LifecycleStatus::Active,
            sale_status: SaleStatus::Draft,
            rejection_reason: None,
            validated_by: None,
            validated_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn attributes(&self) -> ListingAttributes {
        ListingAttributes {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year: self.year,
            price: self.price,
            description: self.description.clone(),
            mileage: self.mileage,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
        }
    }

    /// Merge a partial update; fields left unset keep their current value.
    pub fn apply(&mut self, patch: ListingPatch, now: OffsetDateTime) {
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(mileage) = patch.mileage {
            self.mileage = mileage;
        }
        if let Some(transmission) = patch.transmission {
            self.transmission = transmission;
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        self.updated_at = now;
    }

    /// Public catalog predicate: usable record, moderation passed.
    pub fn publicly_visible(&self) -> bool {
        self.lifecycle_status == LifecycleStatus::Active
            && self.sale_status == SaleStatus::Approved
    }
}

/// Partial update applied by the service layer before the whole-record write.
#[derive(Debug, Default, Clone)]
pub struct ListingPatch {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub mileage: Option<i32>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub images: Option<Vec<String>>,
}

/// Catalog search filter; any unset field imposes no constraint.
#[derive(Debug, Default, Clone)]
pub struct CatalogFilter {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
}

impl CatalogFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(brand) = &self.brand {
            if !listing.brand.to_lowercase().contains(&brand.to_lowercase()) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !listing.model.to_lowercase().contains(&model.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_year {
            if listing.year < min {
                return false;
            }
        }
        if let Some(max) = self.max_year {
            if listing.year > max {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if listing.price > max {
                return false;
            }
        }
        if let Some(t) = self.transmission {
            if listing.transmission != t {
                return false;
            }
        }
        if let Some(f) = self.fuel_type {
            if listing.fuel_type != f {
                return false;
            }
        }
        true
    }
}

/// A listing staged by an unauthenticated visitor, keyed by a caller-supplied
/// session id until it is converted into an owned listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DraftListing {
    pub id: Uuid,
    pub session_id: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub description: String,
    pub mileage: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub images: Vec<String>,
    pub status: DraftStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub version: i64,
}

impl DraftListing {
    pub fn new(
        session_id: String,
        contact_name: String,
        contact_email: String,
        contact_phone: String,
        attrs: ListingAttributes,
        images: Vec<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            contact_name,
            contact_email,
            contact_phone,
            brand: attrs.brand,
            model: attrs.model,
            year: attrs.year,
            price: attrs.price,
            description: attrs.description,
            mileage: attrs.mileage,
            transmission: attrs.transmission,
            fuel_type: attrs.fuel_type,
            images,
            status: DraftStatus::Temporary,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn attributes(&self) -> ListingAttributes {
        ListingAttributes {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year: self.year,
            price: self.price,
            description: self.description.clone(),
            mileage: self.mileage,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
        }
    }

    pub fn apply(&mut self, patch: ListingPatch, now: OffsetDateTime) {
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(mileage) = patch.mileage {
            self.mileage = mileage;
        }
        if let Some(transmission) = patch.transmission {
            self.transmission = transmission;
        }
        if let Some(fuel_type) = patch.fuel_type {
            self.fuel_type = fuel_type;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod filter_tests {
    use super::*;

    fn listing(brand: &str, model: &str, year: i32, price: i64) -> Listing {
        let now = OffsetDateTime::now_utc();
        let owner = Account::new_user(
            "seller@test.com".into(),
            "hash".into(),
            Profile {
                full_name: "Seller".into(),
                phone: "3000000000".into(),
                id_number: "123".into(),
            },
            RoleIntent::Seller,
            now,
        );
        Listing::new(
            &owner,
            ListingAttributes {
                brand: brand.into(),
                model: model.into(),
                year,
                price,
                description: "test".into(),
                mileage: 1000,
                transmission: Transmission::Automatic,
                fuel_type: FuelType::Gasoline,
            },
            vec![],
            now,
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = CatalogFilter::default();
        assert!(filter.matches(&listing("Toyota", "Corolla", 2020, 85_000_000)));
    }

    #[test]
    fn brand_match_is_case_insensitive_substring() {
        let filter = CatalogFilter {
            brand: Some("toyo".into()),
            ..Default::default()
        };
        assert!(filter.matches(&listing("Toyota", "Corolla", 2020, 85_000_000)));
        assert!(!filter.matches(&listing("Mazda", "CX-5", 2021, 120_000_000)));
    }

    #[test]
    fn year_range_is_inclusive() {
        let filter = CatalogFilter {
            min_year: Some(2019),
            max_year: Some(2021),
            ..Default::default()
        };
        assert!(filter.matches(&listing("Toyota", "Corolla", 2019, 1)));
        assert!(filter.matches(&listing("Toyota", "Corolla", 2021, 1)));
        assert!(!filter.matches(&listing("Toyota", "Corolla", 2022, 1)));
    }

    #[test]
    fn price_bounds_apply() {
        let filter = CatalogFilter {
            min_price: Some(50_000_000),
            max_price: Some(100_000_000),
            ..Default::default()
        };
        assert!(filter.matches(&listing("Kia", "Sportage", 2021, 85_000_000)));
        assert!(!filter.matches(&listing("Kia", "Sportage", 2021, 120_000_000)));
    }

    #[test]
    fn merge_preserves_unset_fields() {
        let mut l = listing("Toyota", "Corolla", 2020, 85_000_000);
        let before_model = l.model.clone();
        l.apply(
            ListingPatch {
                price: Some(80_000_000),
                ..Default::default()
            },
            OffsetDateTime::now_utc(),
        );
        assert_eq!(l.price, 80_000_000);
        assert_eq!(l.model, before_model);
    }
}
