//! Entity-to-table adapter.

use crate::catalog::ColumnCatalog;
use crate::mapping::EntityMapping;
use bulkmodel_core::{DataTable, Model, Result};

/// Convert `entities` into a [`DataTable`] shaped by `catalog`.
///
/// The table is named after `M::TABLE_NAME` and has one column per catalog
/// column (only the primary-key columns when `primary_keys_only` is set), in
/// catalog order, and one row per entity, in input order. An empty input
/// yields the schema with zero rows.
///
/// # Errors
///
/// - [`MappingErrorKind::NoColumns`](bulkmodel_core::MappingErrorKind) /
///   `NoPrimaryKey` from the catalog.
/// - `MissingProperty` when a catalog column names a property `M` lacks.
/// - Any error raised while reading a property; no partial table is
///   returned.
#[allow(clippy::result_large_err)]
#[tracing::instrument(
    level = "debug",
    skip(catalog, entities),
    fields(table = M::TABLE_NAME, rows = tracing::field::Empty)
)]
pub fn to_data_table<'e, M, C, I>(
    catalog: &C,
    entities: I,
    primary_keys_only: bool,
) -> Result<DataTable>
where
    M: Model,
    C: ColumnCatalog,
    I: IntoIterator<Item = &'e M>,
{
    let mapping = EntityMapping::<M>::resolve(catalog, primary_keys_only)?;
    let table = mapping.to_table(entities)?;
    tracing::Span::current().record("rows", table.row_count());
    tracing::debug!(
        columns = table.column_count(),
        rows = table.row_count(),
        "Built data table"
    );
    Ok(table)
}
