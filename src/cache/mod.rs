//! # Row Cache Module
//!
//! Interfaces to the row cache the invalidator keeps coherent, plus the
//! canonical key encoding shared with cache readers.
//!
//! ## Architecture
//!
//! ```text
//! RowCacheStore (trait)          <- whole-store operations (clear on startup)
//! RowCache (trait)               <- one partition per cached table
//!   ├── MemoryRowCache           <- dashmap-backed, for embedding and tests
//!   └── NoOpRowCache             <- always-miss, always-succeed
//! CacheKey                       <- deterministic key from a primary-key tuple
//! ```
//!
//! ## Design Decisions
//!
//! - **Delete is idempotent**: deleting an absent key is not an error
//! - **Keys are table-relative**: each table owns its partition, so keys only
//!   encode primary-key values

pub mod errors;
pub mod key;
pub mod providers;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use key::{CacheKey, KeyError};
pub use providers::{MemoryCacheStore, MemoryRowCache, NoOpCacheStore, NoOpRowCache};
pub use traits::{RowCache, RowCacheStore};
