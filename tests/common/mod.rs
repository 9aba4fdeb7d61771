#![allow(dead_code)]

pub mod mocks;
pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use rowcache_invalidator::config::InvalidatorConfig;
use rowcache_invalidator::invalidator::InvalidatorContext;
use rowcache_invalidator::position::{Gtid, ReplicationPosition};
use rowcache_invalidator::schema::{CacheType, ColumnKind, PkColumn, TableDefinition};

pub use mocks::*;

pub const SERVER: &str = "3e11fa47-71ca-11e1-9e33-c80aa9429562";
pub const DB_NAME: &str = "main";

/// `SERVER:sequence` position marker
pub fn gtid(sequence: u64) -> String {
    format!("{SERVER}:{sequence}")
}

pub fn position(sequences: &[u64]) -> ReplicationPosition {
    let mut position = ReplicationPosition::new();
    for sequence in sequences {
        let marker: Gtid = gtid(*sequence).parse().expect("valid gtid");
        position.append(&marker);
    }
    position
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn orders_table(cache_type: CacheType) -> TableDefinition {
    TableDefinition::new("orders", cache_type, vec![PkColumn::new("id", ColumnKind::Integer)])
}

pub fn users_table() -> TableDefinition {
    TableDefinition::new(
        "users",
        CacheType::ReadWrite,
        vec![
            PkColumn::new("tenant", ColumnKind::Text),
            PkColumn::new("id", ColumnKind::Unsigned),
        ],
    )
}

pub fn test_config() -> InvalidatorConfig {
    InvalidatorConfig::new(DB_NAME).with_retry_delay(Duration::from_millis(10))
}

pub fn test_context(
    schema: Arc<RecordingSchemaStore>,
    cache_store: Arc<RecordingCacheStore>,
) -> InvalidatorContext {
    InvalidatorContext::new(test_config(), schema, cache_store)
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
