use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Credentials for the admin account provisioned at startup. Admins never go
/// through the registration path.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub local_store_path: Option<PathBuf>,
    pub jwt: JwtConfig,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok();

        let backend = match std::env::var("STORE_BACKEND").ok().as_deref() {
            Some("postgres") => StoreBackend::Postgres,
            Some("local") => StoreBackend::Local,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND: {other}"),
            None => {
                if database_url.is_some() {
                    StoreBackend::Postgres
                } else {
                    StoreBackend::Local
                }
            }
        };
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required with the postgres backend");
        }

        let local_store_path = std::env::var("LOCAL_STORE_PATH").ok().map(PathBuf::from);

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "autoplaza".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "autoplaza-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let admin = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                full_name: std::env::var("ADMIN_NAME")
                    .unwrap_or_else(|_| "Administrator".into()),
                phone: std::env::var("ADMIN_PHONE").unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            backend,
            database_url,
            local_store_path,
            jwt,
            admin,
        })
    }
}
