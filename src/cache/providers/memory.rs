//! In-memory row cache provider using DashMap
//!
//! Each table gets its own [`MemoryRowCache`] partition; [`MemoryCacheStore`]
//! hands partitions out by table name and clears them all on startup.
//!
//! **Important**: This cache is NOT distributed. It is meant for embedding the
//! invalidator in a single process and for tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::cache::errors::CacheResult;
use crate::cache::key::CacheKey;
use crate::cache::traits::{RowCache, RowCacheStore};

/// One table's cached rows, keyed by [`CacheKey`]
#[derive(Debug, Default)]
pub struct MemoryRowCache {
    rows: DashMap<CacheKey, String>,
    deletes: AtomicU64,
}

impl MemoryRowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    pub fn set(&self, key: CacheKey, row: impl Into<String>) {
        self.rows.insert(key, row.into());
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&self) {
        self.rows.clear();
    }

    /// Delete calls received, including deletes of absent keys
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RowCache for MemoryRowCache {
    async fn delete(&self, key: &CacheKey) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        let removed = self.rows.remove(key).is_some();
        debug!(key = %key, removed, "Cache DEL (memory)");
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Registry of per-table [`MemoryRowCache`] partitions
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    partitions: DashMap<String, Arc<MemoryRowCache>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition for `table`, created empty on first use
    pub fn partition(&self, table: &str) -> Arc<MemoryRowCache> {
        self.partitions
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(MemoryRowCache::new()))
            .clone()
    }

    /// Forget a table's partition entirely
    pub fn remove_partition(&self, table: &str) -> Option<Arc<MemoryRowCache>> {
        self.partitions.remove(table).map(|(_, partition)| partition)
    }

    pub fn total_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }
}

#[async_trait]
impl RowCacheStore for MemoryCacheStore {
    async fn clear_all(&self) -> CacheResult<()> {
        for partition in self.partitions.iter() {
            partition.value().clear();
        }
        debug!(partitions = self.partitions.len(), "Cache CLEAR (memory)");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
