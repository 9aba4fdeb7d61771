//! Whole-table invalidation for statements the stream could not classify.
//!
//! Without row identities the only safe response to a statement that may
//! change existing rows is to reload the table, which discards everything
//! cached for it.

use tracing::{error, instrument, warn};

use super::context::InvalidatorContext;
use crate::constants::internal_errors;
use crate::error::InvalidatorResult;
use crate::parser::{Statement, TableRef};

#[instrument(skip(ctx))]
pub async fn invalidate_unrecognized(ctx: &InvalidatorContext, sql: &str) -> InvalidatorResult<()> {
    let statement = match ctx.statement_parser.parse(sql) {
        Ok(statement) => statement,
        Err(e) => {
            error!(sql = %sql, error = %e, "Unable to parse statement");
            ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
            return Ok(());
        }
    };

    let tables = match statement {
        Statement::Insert { .. } => return Ok(()),
        Statement::Update { tables } | Statement::Delete { tables } => tables,
        Statement::Other { keyword } => {
            error!(sql = %sql, keyword = %keyword, "Unrecognized");
            ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
            return Ok(());
        }
    };

    // Every table is attempted even if an earlier refresh fails
    let mut first_error = None;
    for table in &tables {
        if let Err(e) = invalidate_table(ctx, sql, table).await {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

async fn invalidate_table(ctx: &InvalidatorContext, sql: &str, table: &TableRef) -> InvalidatorResult<()> {
    if table.is_foreign_to(ctx.db_name()) {
        return Ok(());
    }

    let Some(info) = ctx.schema.lookup(&table.name) else {
        error!(sql = %sql, table = %table.name, "Table not found");
        ctx.metrics.record_internal_error(internal_errors::INVALIDATION);
        return Ok(());
    };
    if !info.is_cached() {
        return Ok(());
    }

    warn!(table = %table.name, "Treating '{}' as DDL for table {}", sql, table.name);
    ctx.schema.create_or_refresh(&table.name).await
}
