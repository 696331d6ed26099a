use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{Account, AccountTier, RoleIntent, ValidationStatus};

/// Client-facing projection of an account; never carries the credential hash.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
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
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            email: a.email.clone(),
            full_name: a.full_name.clone(),
            phone: a.phone.clone(),
            id_number: a.id_number.clone(),
            role_intent: a.role_intent,
            tier: a.tier,
            validation_status: a.validation_status,
            is_approved: a.is_approved,
            approved_by: a.approved_by,
            approved_at: a.approved_at,
            created_at: a.created_at,
        }
    }
}
