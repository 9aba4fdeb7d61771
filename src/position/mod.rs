//! # Replication Position
//!
//! GTID-set replication coordinates and the mutex-guarded tracker the
//! invalidator advances as position markers arrive.

pub mod gtid;
pub mod tracker;

pub use gtid::{Gtid, ReplicationPosition};
pub use tracker::PositionTracker;
