//! Item storage
//!
//! The router only talks to [`ItemStore`]; which backend sits behind it is
//! decided once at startup from configuration.

mod memory;

#[cfg(feature = "dynamo")]
mod dynamo;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{StoreBackend, StoreConfig};
use crate::model::{Item, ItemPatch};

pub use memory::MemoryStore;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoStore;

/// Storage-layer failures; all of them surface to clients as 500
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("storage call timed out after {0} ms")]
    Timeout(u64),

    #[error("id already exists: {0}")]
    Conflict(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence operations for items.
///
/// Each call is a single-item operation; there are no multi-item
/// transactions.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Backend label reported by the health endpoint
    fn backend(&self) -> &'static str;

    /// Table name for backends that have one
    fn table_name(&self) -> Option<&str> {
        None
    }

    /// Generate an id that no live or deleted item has used
    fn next_id(&self) -> String;

    async fn get(&self, id: &str) -> Result<Option<Item>>;

    /// All live items, in no guaranteed order
    async fn list(&self) -> Result<Vec<Item>>;

    /// Insert a new item. Fails with [`StoreError::Conflict`] if the id is taken.
    async fn put(&self, item: &Item) -> Result<()>;

    /// Apply `patch` to an existing item; `Ok(None)` if the id is unknown
    async fn update(
        &self,
        id: &str,
        patch: &ItemPatch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<Item>>;

    /// Remove an item and return it; `Ok(None)` if the id is unknown
    async fn delete(&self, id: &str) -> Result<Option<Item>>;
}

/// Run a store call under the configured deadline
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

/// Build the store selected by configuration
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn ItemStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Storage: in-memory item collection");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "dynamo")]
        StoreBackend::Dynamo => {
            let table_name = config.table_name.clone().ok_or_else(|| {
                StoreError::Unavailable("store.table_name is required for dynamo".to_string())
            })?;
            let store = DynamoStore::new(table_name, config.endpoint_url.as_deref()).await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StoreBackend::Dynamo => {
            tracing::error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err(StoreError::Unavailable(
                "dynamo feature not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let value = bounded(Duration::from_millis(50), async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_build_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            table_name: None,
            endpoint_url: None,
            timeout_ms: 1000,
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.table_name().is_none());
    }
}
