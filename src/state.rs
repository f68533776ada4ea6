use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::JwtKeys,
    config::{AppConfig, StorageBackend},
    store::{MemoryStore, PgStore, Store},
};

/// Process-wide dependencies, built once at startup and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match (config.backend, config.database_url.as_deref()) {
            (StorageBackend::Postgres, Some(url)) => {
                let store = PgStore::connect(url, config.max_connections).await?;
                if let Err(e) = store.migrate().await {
                    warn!(error = %e, "migration failed; continuing with existing schema");
                }
                Arc::new(store)
            }
            (StorageBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres")
            }
            (StorageBackend::Memory, _) => {
                warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        info!(backend = ?config.backend, "store ready");

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn Store>) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            config,
            store,
            keys,
        }
    }

    /// Fresh in-memory state with test settings.
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryStore::new()),
        )
    }
}
