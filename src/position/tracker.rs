//! Mutex-guarded current replication position.

use parking_lot::Mutex;

use super::gtid::{Gtid, ReplicationPosition};

/// Holds the position the invalidator has applied up to.
///
/// `get`, `set` and `advance` are serialized by one lock and never do I/O
/// while holding it. Only `set` can move the position backwards.
#[derive(Debug, Default)]
pub struct PositionTracker {
    position: Mutex<ReplicationPosition>,
}

impl PositionTracker {
    pub fn new(position: ReplicationPosition) -> Self {
        Self {
            position: Mutex::new(position),
        }
    }

    pub fn get(&self) -> ReplicationPosition {
        self.position.lock().clone()
    }

    pub fn set(&self, position: ReplicationPosition) {
        *self.position.lock() = position;
    }

    /// Append a decoded transaction marker and return the new position
    pub fn advance(&self, gtid: &Gtid) -> ReplicationPosition {
        let mut position = self.position.lock();
        position.append(gtid);
        position.clone()
    }

    pub fn position_string(&self) -> String {
        self.position.lock().to_string()
    }
}
