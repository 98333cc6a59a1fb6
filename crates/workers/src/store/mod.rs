mod memory;

pub use memory::MemoryAlertStore;

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAlert {
    pub key: String,
    pub value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store write timed out after {0:?}")]
    Timeout(Duration),
    #[error("store backend: {0}")]
    Backend(String),
}

/// Time-bounded key-value store for serialized alerts. Entries disappear on
/// their own once their ttl has elapsed; there is no explicit delete.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Every unexpired entry, ordered by key.
    async fn list_all(&self) -> Result<Vec<StoredAlert>, StoreError>;
}
