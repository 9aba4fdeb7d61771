//! Recording and scripted collaborators for invalidator integration tests.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rowcache_invalidator::cache::{CacheError, CacheKey, CacheResult, RowCache, RowCacheStore};
use rowcache_invalidator::error::{InvalidatorError, InvalidatorResult};
use rowcache_invalidator::events::StreamEvent;
use rowcache_invalidator::position::ReplicationPosition;
use rowcache_invalidator::schema::{SchemaStore, TableDefinition, TableInfo};
use rowcache_invalidator::transport::{
    EventSink, EventStream, ReplicationSource, StopSignal, StreamTransport,
};

/// Row cache that remembers every key it was asked to delete
#[derive(Debug, Default)]
pub struct RecordingRowCache {
    deleted: Mutex<Vec<CacheKey>>,
}

impl RecordingRowCache {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().iter().map(|k| k.as_str().to_string()).collect()
    }
}

#[async_trait]
impl RowCache for RecordingRowCache {
    async fn delete(&self, key: &CacheKey) {
        self.deleted.lock().push(key.clone());
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Debug, Default)]
pub struct RecordingCacheStore {
    pub clears: AtomicUsize,
    pub unreachable: AtomicBool,
}

impl RecordingCacheStore {
    pub fn unreachable() -> Self {
        let store = Self::default();
        store.unreachable.store(true, Ordering::SeqCst);
        store
    }
}

#[async_trait]
impl RowCacheStore for RecordingCacheStore {
    async fn clear_all(&self) -> CacheResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("connection refused".to_string()));
        }
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCall {
    Drop(String),
    Refresh(String),
}

/// Schema store that logs drop/refresh calls in order
#[derive(Debug, Default)]
pub struct RecordingSchemaStore {
    definitions: DashMap<String, TableDefinition>,
    tables: DashMap<String, Arc<TableInfo>>,
    caches: DashMap<String, Arc<RecordingRowCache>>,
    calls: Mutex<Vec<SchemaCall>>,
    panic_on_refresh: Mutex<HashSet<String>>,
}

impl RecordingSchemaStore {
    pub fn with_tables(definitions: impl IntoIterator<Item = TableDefinition>) -> Self {
        let store = Self::default();
        for definition in definitions {
            store.definitions.insert(definition.name.clone(), definition.clone());
            store.install(definition);
        }
        store
    }

    pub fn define(&self, definition: TableDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Remove a table from the catalog while leaving it loaded
    pub fn forget(&self, table: &str) {
        self.definitions.remove(table);
    }

    pub fn panic_on_refresh(&self, table: &str) {
        self.panic_on_refresh.lock().insert(table.to_string());
    }

    pub fn calls(&self) -> Vec<SchemaCall> {
        self.calls.lock().clone()
    }

    /// Cache handle of the table's current metadata
    pub fn cache(&self, table: &str) -> Arc<RecordingRowCache> {
        self.caches
            .get(table)
            .map(|c| Arc::clone(c.value()))
            .unwrap_or_default()
    }

    fn install(&self, definition: TableDefinition) {
        let cache = Arc::new(RecordingRowCache::default());
        self.caches.insert(definition.name.clone(), Arc::clone(&cache));
        let info = TableInfo::new(definition, cache);
        self.tables.insert(info.name.clone(), Arc::new(info));
    }
}

#[async_trait]
impl SchemaStore for RecordingSchemaStore {
    fn lookup(&self, table: &str) -> Option<Arc<TableInfo>> {
        self.tables.get(table).map(|t| Arc::clone(t.value()))
    }

    fn drop_table(&self, table: &str) {
        self.calls.lock().push(SchemaCall::Drop(table.to_string()));
        self.tables.remove(table);
    }

    async fn create_or_refresh(&self, table: &str) -> InvalidatorResult<()> {
        self.calls.lock().push(SchemaCall::Refresh(table.to_string()));
        if self.panic_on_refresh.lock().contains(table) {
            panic!("schema reload exploded for {table}");
        }
        let definition = self
            .definitions
            .get(table)
            .map(|d| d.value().clone())
            .ok_or_else(|| InvalidatorError::bad_input(format!("Table {table} not found in source schema")))?;
        self.install(definition);
        Ok(())
    }
}

/// How a scripted stream attempt ends after delivering its events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Return Ok, as if the source closed the stream
    Clean,
    /// Return a connection error
    Connection,
    /// Return a non-connection stream error
    Failure,
    Panic,
    /// Block until the stop signal fires
    WaitForStop,
    /// Wait for the stop signal, then take this long to wind down
    LingerAfterStop(Duration),
}

#[derive(Debug, Clone)]
pub struct Attempt {
    pub events: Vec<StreamEvent>,
    pub end: StreamEnd,
}

impl Attempt {
    pub fn new(events: Vec<StreamEvent>, end: StreamEnd) -> Self {
        Self { events, end }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new(), StreamEnd::WaitForStop)
    }
}

/// Transport that plays one [`Attempt`] per `open_stream` call and idles
/// once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    attempts: Mutex<VecDeque<Attempt>>,
    starts: Mutex<Vec<ReplicationPosition>>,
}

impl ScriptedTransport {
    pub fn new(attempts: impl IntoIterator<Item = Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into_iter().collect()),
            starts: Mutex::default(),
        }
    }

    /// Positions each attempt was opened at, in order
    pub fn starts(&self) -> Vec<ReplicationPosition> {
        self.starts.lock().clone()
    }

    pub fn opened(&self) -> usize {
        self.starts.lock().len()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open_stream(
        &self,
        _db_name: &str,
        _source: Arc<dyn ReplicationSource>,
        start: ReplicationPosition,
        sink: Arc<dyn EventSink>,
    ) -> InvalidatorResult<Box<dyn EventStream>> {
        self.starts.lock().push(start);
        let attempt = self.attempts.lock().pop_front().unwrap_or_else(Attempt::idle);
        Ok(Box::new(ScriptedStream { attempt, sink }))
    }
}

struct ScriptedStream {
    attempt: Attempt,
    sink: Arc<dyn EventSink>,
}

#[async_trait]
impl EventStream for ScriptedStream {
    async fn drive(self: Box<Self>, mut stop: StopSignal) -> InvalidatorResult<()> {
        let ScriptedStream { attempt, sink } = *self;
        for event in attempt.events {
            if stop.is_stopped() {
                return Ok(());
            }
            sink.process_event(event).await?;
        }
        match attempt.end {
            StreamEnd::Clean => Ok(()),
            StreamEnd::Connection => Err(InvalidatorError::connection("lost connection to source")),
            StreamEnd::Failure => Err(InvalidatorError::stream("corrupt event")),
            StreamEnd::Panic => panic!("stream decoder panicked"),
            StreamEnd::WaitForStop => {
                stop.stopped().await;
                Ok(())
            }
            StreamEnd::LingerAfterStop(linger) => {
                stop.stopped().await;
                tokio::time::sleep(linger).await;
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
pub struct MockSource {
    position: Mutex<Option<ReplicationPosition>>,
    pub streaming_configured: AtomicBool,
    pub health_checks: AtomicUsize,
}

impl MockSource {
    pub fn at(position: ReplicationPosition) -> Self {
        Self {
            position: Mutex::new(Some(position)),
            streaming_configured: AtomicBool::new(true),
            health_checks: AtomicUsize::new(0),
        }
    }

    /// Source whose position query fails
    pub fn unreachable() -> Self {
        Self {
            position: Mutex::new(None),
            streaming_configured: AtomicBool::new(true),
            health_checks: AtomicUsize::new(0),
        }
    }

    pub fn set_position(&self, position: ReplicationPosition) {
        *self.position.lock() = Some(position);
    }

    pub fn health_checks(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplicationSource for MockSource {
    async fn current_position(&self) -> InvalidatorResult<ReplicationPosition> {
        self.position
            .lock()
            .clone()
            .ok_or_else(|| InvalidatorError::connection("source unreachable"))
    }

    fn is_streaming_configured(&self) -> bool {
        self.streaming_configured.load(Ordering::SeqCst)
    }

    fn stream_location(&self) -> String {
        "mock-bin.000001".to_string()
    }

    async fn check_health(&self) -> InvalidatorResult<()> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        Err(InvalidatorError::connection("still unreachable"))
    }
}
