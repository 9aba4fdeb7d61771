//! Shared names and defaults.

/// Default pause between a failed stream attempt and the reconnect.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Event categories as they appear on the wire.
pub mod categories {
    pub const DDL: &str = "DDL";
    pub const DML: &str = "DML";
    pub const ERR: &str = "ERR";
    pub const POS: &str = "POS";
}

/// Internal-error counter categories.
pub mod internal_errors {
    /// Isolated handler failures, stream retries and unknown events
    pub const INVALIDATION: &str = "Invalidation";
    /// Panics caught at the per-event boundary
    pub const PANIC: &str = "Panic";
    /// Primary-key tuples that do not fit the table's key schema
    pub const MISMATCH: &str = "Mismatch";
}

/// Stat names the host may publish (optionally prefixed).
pub mod stats {
    pub const STATE: &str = "RowcacheInvalidatorState";
    pub const POSITION: &str = "RowcacheInvalidatorPosition";
    pub const LAG_SECONDS: &str = "RowcacheInvalidatorLagSeconds";
}
