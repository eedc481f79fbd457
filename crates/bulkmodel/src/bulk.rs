//! Bulk insert, update and delete.
//!
//! Each operation runs the same pipeline:
//!
//! 1. join the active transaction or begin one ([`ensure_transaction`]);
//! 2. convert the entities to a table (primary keys only for delete) and
//!    pick the entities to reconcile;
//! 3. hand the table to the [`BulkCopy`] transport;
//! 4. commit, if the transaction is ours;
//! 5. reconcile the persistence context.
//!
//! A failure in steps 2-3 rolls back an owned transaction and returns the
//! original error. A failed commit is returned as is. In every failure case
//! the tracking set is left untouched. A joined transaction is never
//! finished here.
//!
//! Insert and update mark written entities unchanged, except entities with
//! no primary key value yet (keys the database generates): those cannot be
//! identified and stay as they were.

use bulkmodel_copy::{BulkCopy, BulkCopyOptions, BulkOperation, ColumnCatalog, to_data_table};
use bulkmodel_core::{DataTable, Error, Model, Result, TransactionOps};
use bulkmodel_session::{
    PersistenceContext, TransactionScope, detach, ensure_transaction, mark_unchanged,
};
use serde::Serialize;

/// Options for a bulk operation.
#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    /// Passed through to the transport.
    pub copy: BulkCopyOptions,
    /// After insert or update, detach the entities instead of marking them
    /// unchanged.
    pub detach_after: bool,
}

impl BulkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport options.
    pub fn copy(mut self, copy: BulkCopyOptions) -> Self {
        self.copy = copy;
        self
    }

    /// Detach entities after insert or update.
    pub fn detach_after(mut self, detach: bool) -> Self {
        self.detach_after = detach;
        self
    }
}

/// Outcome of a successful bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub operation: BulkOperation,
    /// Rows the transport reported as affected.
    pub rows_affected: u64,
    /// Whether the operation began (and committed) its own transaction.
    pub owned_transaction: bool,
}

/// Bulk-insert `entities`, then mark the ones with a primary key value
/// unchanged.
#[allow(clippy::result_large_err)]
pub fn bulk_insert<P, M, B, C>(
    ctx: &mut P,
    transport: &mut B,
    catalog: &C,
    entities: &[M],
    options: &BulkOptions,
) -> Result<BulkReport>
where
    P: PersistenceContext,
    M: Model,
    B: BulkCopy + ?Sized,
    C: ColumnCatalog,
{
    run(ctx, transport, catalog, entities, BulkOperation::Insert, options)
}

/// Bulk-update `entities` by primary key, then mark them unchanged.
#[allow(clippy::result_large_err)]
pub fn bulk_update<P, M, B, C>(
    ctx: &mut P,
    transport: &mut B,
    catalog: &C,
    entities: &[M],
    options: &BulkOptions,
) -> Result<BulkReport>
where
    P: PersistenceContext,
    M: Model,
    B: BulkCopy + ?Sized,
    C: ColumnCatalog,
{
    run(ctx, transport, catalog, entities, BulkOperation::Update, options)
}

/// Bulk-delete `entities` by primary key, then detach the ones the context
/// tracks.
#[allow(clippy::result_large_err)]
pub fn bulk_delete<P, M, B, C>(
    ctx: &mut P,
    transport: &mut B,
    catalog: &C,
    entities: &[M],
    options: &BulkOptions,
) -> Result<BulkReport>
where
    P: PersistenceContext,
    M: Model,
    B: BulkCopy + ?Sized,
    C: ColumnCatalog,
{
    run(ctx, transport, catalog, entities, BulkOperation::Delete, options)
}

#[allow(clippy::result_large_err)]
#[tracing::instrument(
    level = "debug",
    skip(ctx, transport, catalog, entities, options),
    fields(
        table = M::TABLE_NAME,
        operation = %operation,
        entities = entities.len(),
        owned = tracing::field::Empty
    )
)]
fn run<P, M, B, C>(
    ctx: &mut P,
    transport: &mut B,
    catalog: &C,
    entities: &[M],
    operation: BulkOperation,
    options: &BulkOptions,
) -> Result<BulkReport>
where
    P: PersistenceContext,
    M: Model,
    B: BulkCopy + ?Sized,
    C: ColumnCatalog,
{
    let scope = ensure_transaction(&*ctx)?;
    let owned = scope.is_owned();
    tracing::Span::current().record("owned", owned);

    let (table, reconcile) = match prepare(&*ctx, catalog, entities, operation, options) {
        Ok(prepared) => prepared,
        Err(err) => return Err(abandon(scope, err)),
    };

    let rows_affected = match transport.write_to_server(operation, &table, &options.copy) {
        Ok(rows) => rows,
        Err(err) => return Err(abandon(scope, err)),
    };

    // Tracking changes only once the rows are durable (or the outer
    // transaction owns them).
    scope.complete()?;

    match reconcile {
        Reconcile::MarkUnchanged(written) => mark_unchanged(ctx, written)?,
        Reconcile::Detach(tracked) => detach(ctx, tracked)?,
    }

    tracing::info!(rows_affected, "Bulk operation complete");
    Ok(BulkReport {
        operation,
        rows_affected,
        owned_transaction: owned,
    })
}

/// How the context is brought up to date after a successful write.
enum Reconcile<'e, M> {
    /// Entities to mark unchanged; all have a primary key value.
    MarkUnchanged(Vec<&'e M>),
    /// Entities to detach; all are currently tracked.
    Detach(Vec<&'e M>),
}

/// Build the table and decide the reconciliation before anything is
/// written, so nothing that can fail is left for after the commit.
#[allow(clippy::result_large_err)]
fn prepare<'e, P, M, C>(
    ctx: &P,
    catalog: &C,
    entities: &'e [M],
    operation: BulkOperation,
    options: &BulkOptions,
) -> Result<(DataTable, Reconcile<'e, M>)>
where
    P: PersistenceContext,
    M: Model,
    C: ColumnCatalog,
{
    let table = to_data_table(catalog, entities, operation.primary_keys_only())?;

    if operation == BulkOperation::Delete || options.detach_after {
        return Ok((table, Reconcile::Detach(tracked_subset(ctx, entities)?)));
    }

    let mut identified = Vec::with_capacity(entities.len());
    for entity in entities {
        if entity.has_primary_key_value()? {
            identified.push(entity);
        }
    }
    let skipped = entities.len() - identified.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Entities without a primary key value stay untracked");
    }
    Ok((table, Reconcile::MarkUnchanged(identified)))
}

/// Roll back an owned transaction after `err`, logging a failed rollback,
/// and hand `err` back.
fn abandon<T: TransactionOps>(scope: TransactionScope<T>, err: Error) -> Error {
    if let Err(rollback_err) = scope.abort() {
        tracing::warn!(
            error = %rollback_err,
            "Rollback after failed bulk operation also failed"
        );
    }
    err
}

/// The entities `ctx` currently tracks.
#[allow(clippy::result_large_err)]
fn tracked_subset<'e, P: PersistenceContext, M: Model>(
    ctx: &P,
    entities: &'e [M],
) -> Result<Vec<&'e M>> {
    let mut tracked = Vec::new();
    for entity in entities {
        if ctx.contains(entity)? {
            tracked.push(entity);
        }
    }
    Ok(tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkmodel_copy::BulkCopyFlags;

    #[test]
    fn test_options_builder() {
        let options = BulkOptions::new()
            .copy(BulkCopyOptions::new().flags(BulkCopyFlags::TABLE_LOCK))
            .detach_after(true);
        assert!(options.detach_after);
        assert!(options.copy.flags.contains(BulkCopyFlags::TABLE_LOCK));
        assert!(!BulkOptions::default().detach_after);
    }

    #[test]
    fn test_report_serializes() {
        let report = BulkReport {
            operation: BulkOperation::Delete,
            rows_affected: 3,
            owned_transaction: true,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["operation"], "Delete");
        assert_eq!(json["rows_affected"], 3);
    }
}
