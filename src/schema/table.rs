//! Table metadata types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::RowCache;

/// Row cache policy of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Rows are never cached; invalidation is skipped
    None,
    /// Rows are cached on read and invalidated on change
    ReadWrite,
    /// Rows are only invalidated (cache is populated elsewhere)
    WriteOnly,
}

impl CacheType {
    pub fn is_cached(&self) -> bool {
        !matches!(self, CacheType::None)
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheType::None => "none",
            CacheType::ReadWrite => "read_write",
            CacheType::WriteOnly => "write_only",
        };
        f.write_str(name)
    }
}

/// Value class of a primary-key column, as far as key encoding cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Unsigned,
    Float,
    Text,
    Binary,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Unsigned => "unsigned",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Binary => "binary",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl PkColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// What the source database says about a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub cache_type: CacheType,
    pub pk_columns: Vec<PkColumn>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, cache_type: CacheType, pk_columns: Vec<PkColumn>) -> Self {
        Self {
            name: name.into(),
            cache_type,
            pk_columns,
        }
    }
}

/// Live metadata for one table, owned by the schema store.
///
/// The invalidator only reads `cache_type`, deletes through `cache()` and bumps
/// the invalidation counter.
#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
    pub cache_type: CacheType,
    pub pk_columns: Vec<PkColumn>,
    cache: Arc<dyn RowCache>,
    invalidations: AtomicU64,
}

impl TableInfo {
    pub fn new(definition: TableDefinition, cache: Arc<dyn RowCache>) -> Self {
        Self {
            name: definition.name,
            cache_type: definition.cache_type,
            pk_columns: definition.pk_columns,
            cache,
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache_type.is_cached()
    }

    pub fn cache(&self) -> &Arc<dyn RowCache> {
        &self.cache
    }

    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    pub fn add_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }
}
