use time::OffsetDateTime;
use tracing::info;

use crate::auth::password::{hash_password, is_valid_email, verify_password};
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::store::{
    Account, AccountTier, MarketStore, Profile, RoleIntent, ValidationStatus,
};

pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub id_number: String,
    pub role_intent: RoleIntent,
}

/// Create a user-tier account in the pending state. Tier is fixed here:
/// the registration path can never produce an admin.
pub async fn register(
    store: &dyn MarketStore,
    input: Registration,
) -> Result<Account, StoreError> {
    if !is_valid_email(&input.email) {
        return Err(StoreError::Validation("invalid email address".into()));
    }
    if input.password.len() < 8 {
        return Err(StoreError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    for (label, value) in [
        ("full name", &input.full_name),
        ("phone", &input.phone),
        ("id number", &input.id_number),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{label} is required")));
        }
    }

    if store.account_by_email(&input.email).await?.is_some() {
        return Err(StoreError::DuplicateEmail);
    }

    let secret_hash = hash_password(&input.password)?;
    let account = Account::new_user(
        input.email,
        secret_hash,
        Profile {
            full_name: input.full_name,
            phone: input.phone,
            id_number: input.id_number,
        },
        input.role_intent,
        OffsetDateTime::now_utc(),
    );

    let created = store.insert_account(account).await?;
    info!(account_id = %created.id, email = %created.email, "account registered");
    Ok(created)
}

/// Credential check plus the approval gate. Admin-tier accounts always pass;
/// user-tier accounts are turned away until an admin has approved them.
pub async fn authenticate(
    store: &dyn MarketStore,
    email: &str,
    password: &str,
) -> Result<Account, StoreError> {
    let Some(account) = store.account_by_email(email).await? else {
        return Err(StoreError::InvalidCredentials);
    };
    if !verify_password(password, &account.secret_hash)? {
        return Err(StoreError::InvalidCredentials);
    }

    if account.tier == AccountTier::Admin {
        return Ok(account);
    }
    if account.validation_status == ValidationStatus::Rejected {
        return Err(StoreError::Rejected);
    }
    if !account.is_approved {
        return Err(StoreError::PendingApproval);
    }
    Ok(account)
}

pub async fn pending_accounts(store: &dyn MarketStore) -> Result<Vec<Account>, StoreError> {
    store.pending_accounts().await
}

pub async fn all_accounts(store: &dyn MarketStore) -> Result<Vec<Account>, StoreError> {
    store.all_accounts().await
}

/// Provision the configured admin account directly in the approved state.
/// Idempotent: an existing account with the same email is left untouched.
pub async fn bootstrap_admin(store: &dyn MarketStore, config: &AppConfig) -> anyhow::Result<()> {
    let Some(admin) = &config.admin else {
        return Ok(());
    };
    if store.account_by_email(&admin.email).await?.is_some() {
        return Ok(());
    }

    let secret_hash = hash_password(&admin.password)?;
    let account = Account::new_admin(
        admin.email.clone(),
        secret_hash,
        Profile {
            full_name: admin.full_name.clone(),
            phone: admin.phone.clone(),
            id_number: String::new(),
        },
        OffsetDateTime::now_utc(),
    );
    let created = store.insert_account(account).await?;
    info!(account_id = %created.id, email = %created.email, "admin account provisioned");
    Ok(())
}
