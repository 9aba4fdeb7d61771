//! Row cache trait definitions

use async_trait::async_trait;

use super::errors::CacheResult;
use super::key::CacheKey;

/// One table's partition of the row cache.
///
/// Only the delete side is needed by the invalidator; readers and writers of
/// cached rows live elsewhere.
#[async_trait]
pub trait RowCache: Send + Sync + std::fmt::Debug {
    /// Remove a cached row. Deleting an absent key succeeds silently.
    async fn delete(&self, key: &CacheKey);

    /// Get the name of the cache provider
    fn provider_name(&self) -> &'static str;
}

/// Operations on the whole row cache store
#[async_trait]
pub trait RowCacheStore: Send + Sync + std::fmt::Debug {
    /// Drop every cached row in every partition
    async fn clear_all(&self) -> CacheResult<()>;

    /// Get the name of the cache provider
    fn provider_name(&self) -> &'static str;
}
