//! # Replication Transport Interfaces
//!
//! The invalidator does not speak the replication protocol itself. A
//! [`StreamTransport`] opens an [`EventStream`] at a position; driving the
//! stream pushes [`StreamEvent`]s into an [`EventSink`] one at a time, in
//! order, until the stream ends, fails, or the [`StopSignal`] fires.
//!
//! The [`ReplicationSource`] is the database being replicated from: it reports
//! where replication currently is and can be health-checked.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::InvalidatorResult;
use crate::events::StreamEvent;
use crate::position::ReplicationPosition;

/// Receives decoded events from a running stream
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Handle one event. An error aborts the current stream attempt.
    async fn process_event(&self, event: StreamEvent) -> InvalidatorResult<()>;
}

/// An open replication stream
#[async_trait]
pub trait EventStream: Send {
    /// Deliver events to the sink until the stream ends or `stop` fires.
    ///
    /// Returns `Ok(())` on a clean end; errors returned by the sink are
    /// propagated unchanged.
    async fn drive(self: Box<Self>, stop: StopSignal) -> InvalidatorResult<()>;
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open_stream(
        &self,
        db_name: &str,
        source: Arc<dyn ReplicationSource>,
        start: ReplicationPosition,
        sink: Arc<dyn EventSink>,
    ) -> InvalidatorResult<Box<dyn EventStream>>;
}

/// The database replication is read from
#[async_trait]
pub trait ReplicationSource: Send + Sync {
    /// Position the source has currently applied
    async fn current_position(&self) -> InvalidatorResult<ReplicationPosition>;

    /// Whether the source writes a replication log that can be streamed
    fn is_streaming_configured(&self) -> bool;

    /// Human-readable location of the stream, for logs
    fn stream_location(&self) -> String;

    /// Out-of-band connectivity probe
    async fn check_health(&self) -> InvalidatorResult<()>;
}

/// Cooperative stop flag handed to a running stream
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Signal pair for callers that manage their own stream lifetime
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested. Also resolves if the sender
    /// is dropped, since no one can run the stream any more.
    pub async fn stopped(&mut self) {
        // wait_for checks the current value first
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
