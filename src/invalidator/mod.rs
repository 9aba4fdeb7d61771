//! # Invalidation Engine
//!
//! - [`supervisor`]: the [`RowcacheInvalidator`] lifecycle and stream loop
//! - [`dispatcher`]: routes each [`StreamEvent`](crate::events::StreamEvent)
//!   to a handler with per-event failure isolation
//! - [`dml`], [`ddl`], [`fallback`]: the handlers

pub mod context;
pub mod ddl;
pub mod dispatcher;
pub mod dml;
pub mod fallback;
pub mod supervised;
pub mod supervisor;

pub use context::InvalidatorContext;
pub use dispatcher::EventDispatcher;
pub use supervised::{supervised, HandlerOutcome};
pub use supervisor::{InvalidatorState, RowcacheInvalidator};
