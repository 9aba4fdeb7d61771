//! # Change Events
//!
//! Wire records delivered by the stream transport and the closed variant the
//! dispatcher matches on.

pub mod types;

pub use types::{ChangeEvent, PkTuple, SqlValue, StreamEvent};
