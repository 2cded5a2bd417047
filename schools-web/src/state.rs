use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use schools_data::{Backend, MemoryStore, PgStore, SchoolStore, SqliteStore};

use crate::config::DatabaseConfig;

/// Shared application state accessible by all handlers
pub struct AppState {
    store: Arc<dyn SchoolStore>,
    /// Backend the configuration asked for. Differs from the store's own
    /// backend when startup fell back to the in-memory list.
    configured: Backend,
}

impl AppState {
    pub fn new(store: Arc<dyn SchoolStore>) -> Arc<Self> {
        let configured = store.backend();
        Arc::new(Self { store, configured })
    }

    /// Serve from sample data because `configured` could not be opened.
    pub fn fallback(configured: Backend) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(MemoryStore::with_sample_data()),
            configured,
        })
    }

    /// Open the configured store, falling back to sample data on failure.
    pub async fn connect(config: &DatabaseConfig) -> Arc<Self> {
        let configured = config.backend();
        match open_store(config).await {
            Ok(store) => {
                info!(backend = %configured, "connected to database");
                Self::new(store)
            }
            Err(e) => {
                warn!(
                    backend = %configured,
                    error = %format!("{:#}", e),
                    "database unavailable, serving in-memory sample data"
                );
                Self::fallback(configured)
            }
        }
    }

    pub fn store(&self) -> &dyn SchoolStore {
        self.store.as_ref()
    }

    pub fn configured_backend(&self) -> Backend {
        self.configured
    }

    /// True when requests are served by a real database.
    pub fn database_connected(&self) -> bool {
        self.store.backend().is_database()
    }

    /// True when requests are served from the volatile in-memory list.
    pub fn is_mock(&self) -> bool {
        self.store.backend() == Backend::Memory
    }

    /// Response message, tagged when the data is not persistent.
    pub fn message(&self, text: &str) -> String {
        if self.is_mock() {
            format!("{} (MOCK DATA)", text)
        } else {
            text.to_string()
        }
    }
}

async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn SchoolStore>> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            let path = path.clone();
            let store = tokio::task::spawn_blocking(move || SqliteStore::open(&path)).await??;
            Ok(Arc::new(store))
        }
        DatabaseConfig::Postgres(settings) => Ok(Arc::new(PgStore::connect(settings).await?)),
        DatabaseConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
