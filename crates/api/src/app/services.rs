use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;

use stockforge_counting::CountPolicy;
use stockforge_infra::{
    DocumentStore, InMemoryDocumentStore, JsonFileStore, Warehouse, WarehouseError,
};

use crate::app::errors;
use crate::config::AppConfig;

/// Everything a handler needs.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub warehouse: Arc<Warehouse>,
}

impl AppServices {
    /// Open the warehouse on the configured store.
    pub fn build(config: &AppConfig) -> Result<Self, WarehouseError> {
        let store: Arc<dyn DocumentStore> = match &config.data_dir {
            Some(dir) => {
                let store = JsonFileStore::open(dir)?;
                tracing::info!(dir = %store.dir().display(), "using JSON file store");
                Arc::new(store)
            }
            None => Arc::new(InMemoryDocumentStore::new()),
        };
        Self::open(store, config.count_policy.clone())
    }

    pub fn in_memory(policy: CountPolicy) -> Result<Self, WarehouseError> {
        Self::open(Arc::new(InMemoryDocumentStore::new()), policy)
    }

    fn open(store: Arc<dyn DocumentStore>, policy: CountPolicy) -> Result<Self, WarehouseError> {
        Ok(Self {
            warehouse: Arc::new(Warehouse::open(store, policy)?),
        })
    }

    /// Run a warehouse call off the async runtime; the file store does blocking IO
    /// while holding the lock.
    pub async fn run<T, F>(&self, f: F) -> Result<T, Response>
    where
        T: Send + 'static,
        F: FnOnce(&Warehouse) -> Result<T, WarehouseError> + Send + 'static,
    {
        let warehouse = Arc::clone(&self.warehouse);
        match tokio::task::spawn_blocking(move || f(&warehouse)).await {
            Ok(result) => result.map_err(errors::warehouse_error_to_response),
            Err(err) => {
                tracing::error!(error = %err, "warehouse task failed");
                Err(errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "warehouse task failed",
                ))
            }
        }
    }
}
