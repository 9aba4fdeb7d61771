//! # Invalidator Metrics
//!
//! In-process counters for the invalidator, readable through
//! [`InvalidatorMetrics::snapshot`]. Internal errors are also mirrored to an
//! OpenTelemetry counter:
//!
//! - `rowcache_invalidator_internal_errors_total` (label: `category`)
//!
//! Without an installed meter provider the OpenTelemetry side is a no-op.

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::constants::internal_errors;
use crate::events::ChangeEvent;

static INVALIDATOR_METER: OnceLock<Meter> = OnceLock::new();

fn meter() -> &'static Meter {
    INVALIDATOR_METER
        .get_or_init(|| opentelemetry::global::meter_provider().meter("rowcache-invalidator"))
}

/// Internal errors by category
///
/// Labels:
/// - category: Invalidation, Panic, Mismatch
pub fn internal_errors_total() -> Counter<u64> {
    meter()
        .u64_counter("rowcache_invalidator_internal_errors_total")
        .with_description("Invalidation failures isolated by the rowcache invalidator")
        .build()
}

#[derive(Debug, Default)]
struct EventCounters {
    ddl: AtomicU64,
    dml: AtomicU64,
    unrecognized: AtomicU64,
    position: AtomicU64,
    unknown: AtomicU64,
}

/// Counters shared between the streaming task and observers
#[derive(Debug)]
pub struct InvalidatorMetrics {
    invalidation_errors: AtomicU64,
    panic_errors: AtomicU64,
    mismatch_errors: AtomicU64,
    events: EventCounters,
    stream_restarts: AtomicU64,
    internal_errors: Counter<u64>,
}

impl Default for InvalidatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidatorMetrics {
    pub fn new() -> Self {
        Self {
            invalidation_errors: AtomicU64::new(0),
            panic_errors: AtomicU64::new(0),
            mismatch_errors: AtomicU64::new(0),
            events: EventCounters::default(),
            stream_restarts: AtomicU64::new(0),
            internal_errors: internal_errors_total(),
        }
    }

    /// Count one internal error under `category`. Unknown categories are
    /// still exported but have no local counter.
    pub fn record_internal_error(&self, category: &'static str) {
        match category {
            internal_errors::INVALIDATION => self.invalidation_errors.fetch_add(1, Ordering::Relaxed),
            internal_errors::PANIC => self.panic_errors.fetch_add(1, Ordering::Relaxed),
            internal_errors::MISMATCH => self.mismatch_errors.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
        self.internal_errors
            .add(1, &[KeyValue::new("category", category)]);
    }

    pub fn record_event(&self, event: &ChangeEvent<'_>) {
        let counter = match event {
            ChangeEvent::Ddl { .. } => &self.events.ddl,
            ChangeEvent::Dml { .. } => &self.events.dml,
            ChangeEvent::Unrecognized { .. } => &self.events.unrecognized,
            ChangeEvent::Position { .. } => &self.events.position,
            ChangeEvent::Unknown { .. } => &self.events.unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_restart(&self) {
        self.stream_restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn internal_error_count(&self, category: &str) -> u64 {
        match category {
            internal_errors::INVALIDATION => self.invalidation_errors.load(Ordering::Relaxed),
            internal_errors::PANIC => self.panic_errors.load(Ordering::Relaxed),
            internal_errors::MISMATCH => self.mismatch_errors.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn stream_restarts(&self) -> u64 {
        self.stream_restarts.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> InvalidatorStatsSnapshot {
        let internal_errors = [
            internal_errors::INVALIDATION,
            internal_errors::PANIC,
            internal_errors::MISMATCH,
        ]
        .into_iter()
        .map(|category| (category.to_string(), self.internal_error_count(category)))
        .collect();

        InvalidatorStatsSnapshot {
            internal_errors,
            ddl_events: self.events.ddl.load(Ordering::Relaxed),
            dml_events: self.events.dml.load(Ordering::Relaxed),
            unrecognized_events: self.events.unrecognized.load(Ordering::Relaxed),
            position_events: self.events.position.load(Ordering::Relaxed),
            unknown_events: self.events.unknown.load(Ordering::Relaxed),
            stream_restarts: self.stream_restarts(),
            state: String::new(),
            position: String::new(),
            lag_seconds: 0,
        }
    }
}

/// Point-in-time view of the invalidator for status pages and tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidatorStatsSnapshot {
    pub state: String,
    pub position: String,
    pub lag_seconds: i64,
    pub internal_errors: BTreeMap<String, u64>,
    pub ddl_events: u64,
    pub dml_events: u64,
    pub unrecognized_events: u64,
    pub position_events: u64,
    pub unknown_events: u64,
    pub stream_restarts: u64,
}

impl InvalidatorStatsSnapshot {
    pub fn internal_errors(&self, category: &str) -> u64 {
        self.internal_errors.get(category).copied().unwrap_or(0)
    }

    pub fn total_events(&self) -> u64 {
        self.ddl_events
            + self.dml_events
            + self.unrecognized_events
            + self.position_events
            + self.unknown_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_counters() {
        let metrics = InvalidatorMetrics::new();
        metrics.record_internal_error(internal_errors::INVALIDATION);
        metrics.record_internal_error(internal_errors::INVALIDATION);
        metrics.record_internal_error(internal_errors::MISMATCH);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.internal_errors("Invalidation"), 2);
        assert_eq!(snapshot.internal_errors("Mismatch"), 1);
        assert_eq!(snapshot.internal_errors("Panic"), 0);
        assert_eq!(snapshot.internal_errors("Nope"), 0);
    }

    #[test]
    fn test_event_counters() {
        let metrics = InvalidatorMetrics::new();
        metrics.record_event(&ChangeEvent::Ddl { sql: "DROP TABLE t" });
        metrics.record_event(&ChangeEvent::Position { transaction_id: "x" });
        metrics.record_event(&ChangeEvent::Unknown { category: "BOGUS" });
        metrics.record_stream_restart();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ddl_events, 1);
        assert_eq!(snapshot.position_events, 1);
        assert_eq!(snapshot.unknown_events, 1);
        assert_eq!(snapshot.total_events(), 3);
        assert_eq!(snapshot.stream_restarts, 1);
    }
}
