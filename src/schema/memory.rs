//! In-memory schema store.
//!
//! The catalog plays the role of the source database's information schema:
//! `create_or_refresh` reads a table's definition from it and rebuilds the live
//! [`TableInfo`] with an empty cache partition, so rows cached under the old
//! definition are gone.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::store::SchemaStore;
use super::table::{TableDefinition, TableInfo};
use crate::cache::MemoryCacheStore;
use crate::error::{InvalidatorError, InvalidatorResult};

#[derive(Debug)]
pub struct MemorySchemaStore {
    catalog: DashMap<String, TableDefinition>,
    tables: DashMap<String, Arc<TableInfo>>,
    cache_store: Arc<MemoryCacheStore>,
}

impl MemorySchemaStore {
    pub fn new(cache_store: Arc<MemoryCacheStore>) -> Self {
        Self {
            catalog: DashMap::new(),
            tables: DashMap::new(),
            cache_store,
        }
    }

    /// Store with every definition both in the catalog and live
    pub fn with_tables(
        cache_store: Arc<MemoryCacheStore>,
        definitions: impl IntoIterator<Item = TableDefinition>,
    ) -> Self {
        let store = Self::new(cache_store);
        for definition in definitions {
            store.define_table(definition.clone());
            store.load(definition);
        }
        store
    }

    /// Record (or replace) a table in the catalog without touching live metadata
    pub fn define_table(&self, definition: TableDefinition) {
        self.catalog.insert(definition.name.clone(), definition);
    }

    /// Remove a table from the catalog, as if it no longer existed at the source
    pub fn undefine_table(&self, table: &str) -> Option<TableDefinition> {
        self.catalog.remove(table).map(|(_, definition)| definition)
    }

    pub fn cache_store(&self) -> &Arc<MemoryCacheStore> {
        &self.cache_store
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    fn load(&self, definition: TableDefinition) -> Arc<TableInfo> {
        self.cache_store.remove_partition(&definition.name);
        let partition = self.cache_store.partition(&definition.name);
        let info = Arc::new(TableInfo::new(definition, partition));
        self.tables.insert(info.name.clone(), Arc::clone(&info));
        info
    }
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    fn lookup(&self, table: &str) -> Option<Arc<TableInfo>> {
        self.tables.get(table).map(|info| Arc::clone(info.value()))
    }

    fn drop_table(&self, table: &str) {
        let dropped = self.tables.remove(table).is_some();
        self.cache_store.remove_partition(table);
        debug!(table = %table, dropped, "Dropped table metadata");
    }

    async fn create_or_refresh(&self, table: &str) -> InvalidatorResult<()> {
        let definition = self
            .catalog
            .get(table)
            .map(|definition| definition.value().clone())
            .ok_or_else(|| {
                InvalidatorError::bad_input(format!("Table {table} not found in source schema"))
            })?;

        let info = self.load(definition);
        info!(
            table = %info.name,
            cache_type = %info.cache_type,
            pk_columns = info.pk_columns.len(),
            "Loaded table metadata"
        );
        Ok(())
    }
}
