//! Row-level invalidation for DML events.

use tracing::{debug, error, instrument};

use super::context::InvalidatorContext;
use crate::cache::CacheKey;
use crate::constants::internal_errors;
use crate::error::{InvalidatorError, InvalidatorResult};
use crate::events::PkTuple;

/// Delete the cached row for every primary-key tuple the statement touched.
///
/// Tuples that do not fit the table's key schema are skipped and counted as
/// `Mismatch`; the rest of the event is still applied.
#[instrument(skip(ctx, primary_keys), fields(table = %table_name, rows = primary_keys.len()))]
pub async fn invalidate_rows(
    ctx: &InvalidatorContext,
    table_name: &str,
    primary_keys: &[PkTuple],
) -> InvalidatorResult<()> {
    let table = ctx
        .schema
        .lookup(table_name)
        .ok_or_else(|| InvalidatorError::bad_input(format!("Table {table_name} not found")))?;

    if !table.is_cached() {
        return Ok(());
    }

    let mut invalidations = 0u64;
    for tuple in primary_keys {
        match CacheKey::build(&table.pk_columns, tuple) {
            Ok(key) => {
                table.cache().delete(&key).await;
                invalidations += 1;
            }
            Err(e) if e.is_mismatch() => {
                ctx.metrics.record_internal_error(internal_errors::MISMATCH);
                error!(table = %table_name, error = %e, values = ?tuple, "Primary key mismatch");
            }
            Err(e) => {
                debug!(table = %table_name, error = %e, "Skipping row without a cache key");
            }
        }
    }

    table.add_invalidations(invalidations);
    Ok(())
}
