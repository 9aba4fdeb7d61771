//! Metadata invalidation for DDL events.

use tracing::{debug, instrument};

use super::context::InvalidatorContext;
use crate::error::{InvalidatorError, InvalidatorResult};

/// Drop stale table metadata and load the new definition.
///
/// The old table is dropped before the new one is loaded, so a rename never
/// leaves both names pointing at live metadata.
#[instrument(skip(ctx))]
pub async fn apply_schema_change(ctx: &InvalidatorContext, sql: &str) -> InvalidatorResult<()> {
    let plan = ctx.ddl_parser.parse(sql);
    let Some(action) = plan.action else {
        return Err(InvalidatorError::bad_input(format!("DDL is not understood: {sql}")));
    };
    debug!(
        action = %action,
        table_name = ?plan.table_name,
        new_name = ?plan.new_name,
        "Applying schema change"
    );

    if let Some(table_name) = plan.table_name.as_deref() {
        if plan.new_name.as_deref() != Some(table_name) {
            ctx.schema.drop_table(table_name);
        }
    }
    if let Some(new_name) = plan.new_name.as_deref() {
        ctx.schema.create_or_refresh(new_name).await?;
    }
    Ok(())
}
