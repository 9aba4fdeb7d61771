//! Event classification and routing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{error, info};

use super::context::InvalidatorContext;
use super::supervised::{supervised, HandlerOutcome};
use super::{ddl, dml, fallback};
use crate::constants::internal_errors;
use crate::error::InvalidatorResult;
use crate::events::{ChangeEvent, StreamEvent};
use crate::position::Gtid;
use crate::transport::EventSink;

/// Routes stream events to the invalidation handlers.
///
/// Handler failures and panics are logged, counted and swallowed so the next
/// event is always processed. Only a malformed position marker is returned to
/// the transport, since advancing past it would corrupt the tracked position.
#[derive(Debug)]
pub struct EventDispatcher {
    ctx: InvalidatorContext,
    lag_seconds: AtomicI64,
}

impl EventDispatcher {
    pub fn new(ctx: InvalidatorContext) -> Self {
        Self {
            ctx,
            lag_seconds: AtomicI64::new(0),
        }
    }

    pub fn context(&self) -> &InvalidatorContext {
        &self.ctx
    }

    /// Seconds between the last applied event's timestamp and when it was applied
    pub fn lag_seconds(&self) -> i64 {
        self.lag_seconds.load(Ordering::Relaxed)
    }

    /// Returns true if the handler completed
    fn settle(&self, event: &StreamEvent, outcome: HandlerOutcome) -> bool {
        match outcome {
            HandlerOutcome::Completed => true,
            HandlerOutcome::Failed(e) => {
                error!(error = %e, event = ?event, "Invalidation failed");
                self.ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
                false
            }
            HandlerOutcome::Panicked { message, backtrace } => {
                error!(
                    panic = %message,
                    event = ?event,
                    backtrace = %backtrace,
                    "Uncaught panic while processing event"
                );
                self.ctx.metrics.record_internal_error(internal_errors::PANIC);
                false
            }
        }
    }

    fn record_lag(&self, timestamp: i64) {
        let lag = chrono::Utc::now().timestamp() - timestamp;
        self.lag_seconds.store(lag, Ordering::Relaxed);
    }
}

#[async_trait]
impl EventSink for EventDispatcher {
    async fn process_event(&self, event: StreamEvent) -> InvalidatorResult<()> {
        let change = event.change();
        self.ctx.metrics.record_event(&change);

        let applied = match change {
            ChangeEvent::Ddl { sql } => {
                info!(sql = %sql, "DDL invalidation");
                let outcome = supervised(ddl::apply_schema_change(&self.ctx, sql)).await;
                self.settle(&event, outcome)
            }
            ChangeEvent::Dml {
                table_name,
                primary_keys,
            } => {
                let outcome = supervised(dml::invalidate_rows(&self.ctx, table_name, primary_keys)).await;
                self.settle(&event, outcome)
            }
            ChangeEvent::Unrecognized { sql } => {
                let outcome = supervised(fallback::invalidate_unrecognized(&self.ctx, sql)).await;
                self.settle(&event, outcome)
            }
            ChangeEvent::Position { transaction_id } => {
                let gtid = Gtid::decode(transaction_id)?;
                self.ctx.position.advance(&gtid);
                true
            }
            ChangeEvent::Unknown { category } => {
                error!(category = %category, event = ?event, "Unknown event");
                self.ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
                false
            }
        };

        if applied {
            self.record_lag(event.timestamp);
        }
        Ok(())
    }
}
