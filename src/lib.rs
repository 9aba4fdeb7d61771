#![allow(clippy::doc_markdown)] // Allow technical terms like MySQL, GTID in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Rowcache Invalidator
//!
//! Keeps an in-memory row cache consistent with a MySQL-style replication
//! stream.
//!
//! ## Overview
//!
//! The invalidator subscribes to a change-event stream and, for every event,
//! removes exactly the cached rows it affects. When the affected rows cannot
//! be identified it discards the whole table's cache by reloading the table.
//! It tracks the replication position (a GTID set) so a broken stream resumes
//! where it left off.
//!
//! ## Module Organization
//!
//! - [`invalidator`] - Supervisor, dispatcher and invalidation handlers
//! - [`position`] - GTID sets and the position tracker
//! - [`events`] - Stream event wire types
//! - [`transport`] - Traits for the replication stream and source
//! - [`cache`] - Row cache traits, keys and in-memory providers
//! - [`schema`] - Table metadata and the schema store
//! - [`parser`] - Keyword-based DDL and DML table extraction
//! - [`config`] - Layered configuration
//! - [`metrics`] - Counters and stats snapshot
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rowcache_invalidator::cache::MemoryCacheStore;
//! use rowcache_invalidator::config::ConfigLoader;
//! use rowcache_invalidator::invalidator::{InvalidatorContext, RowcacheInvalidator};
//! use rowcache_invalidator::schema::MemorySchemaStore;
//! use rowcache_invalidator::transport::{ReplicationSource, StreamTransport};
//!
//! # async fn example(
//! #     transport: Arc<dyn StreamTransport>,
//! #     source: Arc<dyn ReplicationSource>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! rowcache_invalidator::logging::init_tracing();
//!
//! let config = ConfigLoader::load()?;
//! let cache_store = Arc::new(MemoryCacheStore::new());
//! let schema = Arc::new(MemorySchemaStore::new(Arc::clone(&cache_store)));
//! let context = InvalidatorContext::new(config, schema, cache_store);
//!
//! let invalidator = Arc::new(RowcacheInvalidator::new(context, transport));
//! invalidator.open(source).await?;
//! println!("invalidator {} at {}", invalidator.state_name(), invalidator.position_string());
//! invalidator.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod invalidator;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod position;
pub mod schema;
pub mod transport;

pub use cache::{CacheKey, RowCache, RowCacheStore};
pub use config::InvalidatorConfig;
pub use error::{ErrorKind, InvalidatorError, InvalidatorResult};
pub use events::{ChangeEvent, SqlValue, StreamEvent};
pub use invalidator::{InvalidatorContext, RowcacheInvalidator};
pub use metrics::{InvalidatorMetrics, InvalidatorStatsSnapshot};
pub use position::{Gtid, PositionTracker, ReplicationPosition};
pub use schema::{CacheType, SchemaStore, TableInfo};
pub use transport::{EventSink, EventStream, ReplicationSource, StopSignal, StreamTransport};
