use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::store::{LocalStore, MarketStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn MarketStore> = match config.backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL not set"))?;
                Arc::new(PgStore::connect(url).await?)
            }
            StoreBackend::Local => match &config.local_store_path {
                Some(path) => Arc::new(LocalStore::open(path.clone()).await?),
                None => Arc::new(LocalStore::ephemeral()),
            },
        };

        Ok(Self { store, config })
    }

    pub fn from_parts(store: Arc<dyn MarketStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            backend: StoreBackend::Local,
            database_url: None,
            local_store_path: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            admin: None,
        });

        Self {
            store: Arc::new(LocalStore::ephemeral()),
            config,
        }
    }
}
