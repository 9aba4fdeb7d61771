//! # Schema Metadata
//!
//! Table metadata the invalidator reads (cache policy, key columns, cache
//! partition) and the store interface it uses to drop and rebuild tables after
//! schema changes.

pub mod memory;
pub mod store;
pub mod table;

pub use memory::MemorySchemaStore;
pub use store::SchemaStore;
pub use table::{CacheType, ColumnKind, PkColumn, TableDefinition, TableInfo};
