//! Streaming supervisor.
//!
//! [`RowcacheInvalidator`] owns the background task that keeps a replication
//! stream open. Each attempt starts at the tracked position; when an attempt
//! ends for any reason other than a requested stop, the task waits
//! `retry_delay` and reconnects. There is no retry limit.

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::context::InvalidatorContext;
use super::dispatcher::EventDispatcher;
use crate::constants::{internal_errors, stats};
use crate::error::{InvalidatorError, InvalidatorResult};
use crate::metrics::InvalidatorStatsSnapshot;
use crate::position::ReplicationPosition;
use crate::transport::{EventSink, ReplicationSource, StopSignal, StreamTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidatorState {
    Stopped,
    Running,
    /// `close` has signalled the stream task and is waiting for it to exit
    Stopping,
}

impl InvalidatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidatorState::Stopped => "Stopped",
            InvalidatorState::Running => "Running",
            InvalidatorState::Stopping => "Stopping",
        }
    }
}

impl std::fmt::Display for InvalidatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the running stream task
#[derive(Debug)]
struct ServiceHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Keeps the row cache consistent with a replication stream.
///
/// Owned by the host and shared through `Arc`. `open` and `close` are
/// serialized with each other; the observability accessors never block on
/// them.
pub struct RowcacheInvalidator {
    invalidator_id: Uuid,
    ctx: InvalidatorContext,
    transport: Arc<dyn StreamTransport>,
    dispatcher: Arc<EventDispatcher>,
    state: RwLock<InvalidatorState>,
    handle: tokio::sync::Mutex<Option<ServiceHandle>>,
    started_at: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for RowcacheInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowcacheInvalidator")
            .field("invalidator_id", &self.invalidator_id)
            .field("db_name", &self.ctx.db_name())
            .field("state", &*self.state.read())
            .field("cache_store", &self.ctx.cache_store.provider_name())
            .finish()
    }
}

impl RowcacheInvalidator {
    pub fn new(ctx: InvalidatorContext, transport: Arc<dyn StreamTransport>) -> Self {
        let invalidator_id = Uuid::new_v4();
        debug!(
            invalidator_id = %invalidator_id,
            db_name = %ctx.db_name(),
            retry_delay = ?ctx.config.retry_delay(),
            "Creating RowcacheInvalidator"
        );

        Self {
            invalidator_id,
            dispatcher: Arc::new(EventDispatcher::new(ctx.clone())),
            ctx,
            transport,
            state: RwLock::new(InvalidatorState::Stopped),
            handle: tokio::sync::Mutex::new(None),
            started_at: Mutex::new(None),
        }
    }

    /// Start streaming from the source's current position.
    ///
    /// A no-op when already running. Any precondition failure is `Fatal` and
    /// leaves the invalidator stopped.
    #[instrument(skip(self, source), fields(invalidator_id = %self.invalidator_id))]
    pub async fn open(&self, source: Arc<dyn ReplicationSource>) -> InvalidatorResult<()> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Ok(());
        }

        let position = source.current_position().await.map_err(|e| {
            InvalidatorError::fatal(format!("cannot determine replication position: {e}"))
        })?;
        if !source.is_streaming_configured() {
            return Err(InvalidatorError::fatal("binlog path not specified"));
        }
        self.ctx.cache_store.clear_all().await.map_err(|e| {
            error!(error = %e, provider = %self.ctx.cache_store.provider_name(), "Rowcache clear failed");
            InvalidatorError::fatal("rowcache is not reachable")
        })?;

        self.ctx.position.set(position.clone());

        let (stop_tx, stop_rx) = watch::channel(false);
        let stream_loop = StreamLoop {
            ctx: self.ctx.clone(),
            transport: Arc::clone(&self.transport),
            sink: Arc::clone(&self.dispatcher) as Arc<dyn EventSink>,
            source: Arc::clone(&source),
            stop: StopSignal::new(stop_rx),
        };
        let join = tokio::spawn(stream_loop.run());

        *handle = Some(ServiceHandle { stop_tx, join });
        *self.state.write() = InvalidatorState::Running;
        *self.started_at.lock() = Some(Instant::now());

        info!(
            db_name = %self.ctx.db_name(),
            stream_location = %source.stream_location(),
            position = %position,
            "Rowcache invalidator starting"
        );
        Ok(())
    }

    /// Stop streaming and wait for the task to exit. A no-op when stopped.
    #[instrument(skip(self), fields(invalidator_id = %self.invalidator_id))]
    pub async fn close(&self) {
        let mut handle = self.handle.lock().await;
        let Some(service) = handle.take() else {
            return;
        };

        *self.state.write() = InvalidatorState::Stopping;
        // The receiver is only gone if the task already exited
        let _ = service.stop_tx.send(true);
        if let Err(e) = service.join.await {
            error!(error = %e, "Rowcache invalidator task ended abnormally");
        }

        *self.state.write() = InvalidatorState::Stopped;
        let uptime = self.started_at.lock().take().map(|started| started.elapsed());
        info!(
            position = %self.ctx.position.position_string(),
            uptime = ?uptime,
            "Rowcache invalidator stopped"
        );
    }

    pub fn state(&self) -> InvalidatorState {
        *self.state.read()
    }

    pub fn state_name(&self) -> &'static str {
        self.state().as_str()
    }

    pub fn is_running(&self) -> bool {
        self.state() == InvalidatorState::Running
    }

    pub fn position(&self) -> ReplicationPosition {
        self.ctx.position.get()
    }

    pub fn position_string(&self) -> String {
        self.ctx.position.position_string()
    }

    pub fn lag_seconds(&self) -> i64 {
        self.dispatcher.lag_seconds()
    }

    pub fn stats(&self) -> InvalidatorStatsSnapshot {
        InvalidatorStatsSnapshot {
            state: self.state_name().to_string(),
            position: self.position_string(),
            lag_seconds: self.lag_seconds(),
            ..self.ctx.metrics.snapshot()
        }
    }

    /// State, position and lag under their (prefixed) stat names, for hosts
    /// that publish them. Empty when publishing is disabled.
    pub fn published_stats(&self) -> Vec<(String, String)> {
        if !self.ctx.config.publish_stats {
            return Vec::new();
        }
        let config = &self.ctx.config;
        vec![
            (config.stat_name(stats::STATE), self.state_name().to_string()),
            (config.stat_name(stats::POSITION), self.position_string()),
            (config.stat_name(stats::LAG_SECONDS), self.lag_seconds().to_string()),
        ]
    }

    pub fn context(&self) -> &InvalidatorContext {
        &self.ctx
    }
}

/// State moved into the background task
struct StreamLoop {
    ctx: InvalidatorContext,
    transport: Arc<dyn StreamTransport>,
    sink: Arc<dyn EventSink>,
    source: Arc<dyn ReplicationSource>,
    stop: StopSignal,
}

impl StreamLoop {
    async fn run(self) {
        let retry_delay = self.ctx.config.retry_delay();

        loop {
            let start = self.ctx.position.get();
            let result = AssertUnwindSafe(self.stream_once(start.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(InvalidatorError::unexpected_from_panic(payload)));

            if self.stop.is_stopped() {
                break;
            }

            let error = match result {
                Ok(()) => {
                    warn!(position = %start, "Replication stream ended while running");
                    InvalidatorError::stream("stream ended while running")
                }
                Err(e) => e,
            };
            error!(error = %error, kind = %error.kind(), position = %start, "stream returned err, retrying");
            self.ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
            self.ctx.metrics.record_stream_restart();

            if error.is_connection_error() && self.ctx.config.health_check_on_connection_error {
                self.spawn_health_check();
            }

            let mut stop = self.stop.clone();
            tokio::select! {
                _ = tokio::time::sleep(retry_delay) => {}
                _ = stop.stopped() => break,
            }
        }

        debug!(position = %self.ctx.position.position_string(), "Stream loop exited");
    }

    async fn stream_once(&self, start: ReplicationPosition) -> InvalidatorResult<()> {
        let stream = self
            .transport
            .open_stream(
                self.ctx.db_name(),
                Arc::clone(&self.source),
                start,
                Arc::clone(&self.sink),
            )
            .await?;
        stream.drive(self.stop.clone()).await
    }

    fn spawn_health_check(&self) {
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            if let Err(e) = source.check_health().await {
                warn!(error = %e, "Replication source health check failed");
            }
        });
    }
}
