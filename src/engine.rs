use std::collections::HashMap;
use std::sync::Arc;

use fjall::Database;
use parking_lot::Mutex;
use tracing::info;

use crate::collection::Collection;
use crate::config::EngineConfig;
use crate::error::{Result, TokenDbError};
use crate::metrics::EngineMetrics;
use crate::models::Record;
use crate::store::Store;

/// Process-wide handle to one data directory.
///
/// Opens the fjall database once and hands out a [`Collection`] per record
/// kind. Collections of the same kind share one [`Store`] and therefore one
/// writer lock.
pub struct Engine {
    db: Arc<Database>,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
    stores: Mutex<HashMap<&'static str, Arc<Store>>>,
}

impl Engine {
    pub fn open(config: EngineConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = Database::builder(&config.data_dir).open().map_err(|e| {
            TokenDbError::Store(format!(
                "failed to open database at {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;
        let metrics = EngineMetrics::new()
            .map_err(|e| TokenDbError::Internal(format!("failed to register metrics: {}", e)))?;

        info!(
            data_dir = %config.data_dir.display(),
            durability = ?config.durability,
            "opened engine"
        );

        Ok(Self {
            db: Arc::new(db),
            config,
            metrics: Arc::new(metrics),
            stores: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        self.metrics.clone()
    }

    /// Collection for records of kind `R`, opening its keyspace on first use.
    pub fn collection<R: Record>(&self) -> Result<Collection<R>> {
        let mut stores = self.stores.lock();
        let store = match stores.get(R::KIND) {
            Some(store) => store.clone(),
            None => {
                let store = Arc::new(Store::open(
                    self.db.clone(),
                    R::KIND,
                    self.config.durability,
                )?);
                info!(kind = R::KIND, "opened collection");
                stores.insert(R::KIND, store.clone());
                store
            }
        };
        Ok(Collection::new(store, self.metrics.clone()))
    }
}
