//! No-op row cache provider
//!
//! Used for tables or deployments where rowcache is disabled.

use async_trait::async_trait;

use crate::cache::errors::CacheResult;
use crate::cache::key::CacheKey;
use crate::cache::traits::{RowCache, RowCacheStore};

/// Row cache partition that holds nothing
#[derive(Debug, Clone, Default)]
pub struct NoOpRowCache;

impl NoOpRowCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RowCache for NoOpRowCache {
    async fn delete(&self, _key: &CacheKey) {}

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

/// Store whose clear always succeeds
#[derive(Debug, Clone, Default)]
pub struct NoOpCacheStore;

impl NoOpCacheStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RowCacheStore for NoOpCacheStore {
    async fn clear_all(&self) -> CacheResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
