//! Schema metadata store trait definition

use async_trait::async_trait;
use std::sync::Arc;

use super::table::TableInfo;
use crate::error::InvalidatorResult;

/// Resolves table names to metadata and rebuilds metadata after DDL.
///
/// Implementations provide their own concurrency safety: query traffic reads
/// while the invalidator drops and refreshes.
#[async_trait]
pub trait SchemaStore: Send + Sync + std::fmt::Debug {
    /// Current metadata for `table`, if tracked
    fn lookup(&self, table: &str) -> Option<Arc<TableInfo>>;

    /// Forget `table` and everything cached for it
    fn drop_table(&self, table: &str);

    /// Reload `table` from the source and establish its cache policy.
    ///
    /// Any rows cached under the previous definition must not survive.
    async fn create_or_refresh(&self, table: &str) -> InvalidatorResult<()>;
}
