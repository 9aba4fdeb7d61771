//! Row cache provider implementations

pub mod memory;
pub mod noop;

pub use memory::{MemoryCacheStore, MemoryRowCache};
pub use noop::{NoOpCacheStore, NoOpRowCache};
