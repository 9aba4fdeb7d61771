use proptest::prelude::*;

use rowcache_invalidator::events::SqlValue;
use rowcache_invalidator::schema::{ColumnKind, PkColumn};

/// Strategy for generating SQL identifiers
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,30}"
}

/// Strategy for (text, integer) primary-key tuples, text including separators
/// and non-printable bytes
pub fn composite_tuple_strategy() -> impl Strategy<Value = Vec<SqlValue>> {
    (".{0,12}", any::<i64>()).prop_map(|(text, id)| vec![SqlValue::Text(text), SqlValue::Int(id)])
}

pub fn composite_columns() -> Vec<PkColumn> {
    vec![
        PkColumn::new("tenant", ColumnKind::Text),
        PkColumn::new("id", ColumnKind::Integer),
    ]
}

/// Strategy for GTID sequence numbers, in arbitrary order with repeats
pub fn sequence_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..200, 1..50)
}
