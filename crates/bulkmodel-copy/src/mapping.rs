//! Resolved entity-to-column mapping.
//!
//! [`EntityMapping::resolve`] pairs every catalog column with the static
//! accessor of the property it names. Resolution happens once, before any
//! row is built, so a catalog/entity mismatch fails fast and never yields a
//! row with a missing value.

use crate::catalog::{ColumnCatalog, ColumnDescriptor};
use bulkmodel_core::{
    DataColumn, DataTable, Error, FieldAccessor, MappingError, MappingErrorKind, Model, Result,
    Value,
};

/// Columns of `M` paired with their accessors, in catalog order.
pub struct EntityMapping<M: Model> {
    columns: Vec<ResolvedColumn<M>>,
}

struct ResolvedColumn<M> {
    descriptor: ColumnDescriptor,
    accessor: FieldAccessor<M>,
}

impl<M: Model> EntityMapping<M> {
    /// Resolve `M`'s columns from `catalog`.
    ///
    /// Property names are matched exactly (case-sensitive). A column naming
    /// a property `M` does not expose is a
    /// [`MappingErrorKind::MissingProperty`] error.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(
        level = "debug",
        skip(catalog),
        fields(model = std::any::type_name::<M>(), table = M::TABLE_NAME)
    )]
    pub fn resolve<C: ColumnCatalog>(catalog: &C, primary_keys_only: bool) -> Result<Self> {
        let descriptors = catalog.columns::<M>(primary_keys_only)?;

        let mut columns = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let Some(accessor) = M::accessor(&descriptor.property_name) else {
                tracing::warn!(
                    property = %descriptor.property_name,
                    column = %descriptor.column_name,
                    "Catalog column has no matching entity property"
                );
                return Err(Error::Mapping(MappingError {
                    kind: MappingErrorKind::MissingProperty,
                    table: M::TABLE_NAME.to_string(),
                    message: format!(
                        "{} has no property '{}' for column '{}'",
                        std::any::type_name::<M>(),
                        descriptor.property_name,
                        descriptor.column_name
                    ),
                    column: Some(descriptor.column_name),
                    property: Some(descriptor.property_name),
                }));
            };
            columns.push(ResolvedColumn {
                descriptor,
                accessor: *accessor,
            });
        }

        tracing::debug!(columns = columns.len(), "Resolved entity mapping");
        Ok(Self { columns })
    }

    /// Column descriptors in order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().map(|c| &c.descriptor)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// An empty table with this mapping's schema.
    ///
    /// Columns carry the underlying type; nullability is the `allow_null`
    /// flag.
    #[allow(clippy::result_large_err)]
    pub fn schema(&self) -> Result<DataTable> {
        let mut table = DataTable::new(M::TABLE_NAME);
        for column in &self.columns {
            let d = &column.descriptor;
            table.add_column(
                DataColumn::new(d.column_name.clone(), d.sql_type.clone())
                    .allow_null(d.nullable)
                    .primary_key(d.primary_key),
            )?;
        }
        Ok(table)
    }

    /// Read one entity's values in column order.
    #[allow(clippy::result_large_err)]
    pub fn row(&self, entity: &M) -> Result<Vec<Value>> {
        self.columns
            .iter()
            .map(|column| {
                column.accessor.get(entity).map_err(|err| match err {
                    Error::Type(mut e) => {
                        e.column.get_or_insert_with(|| column.descriptor.column_name.clone());
                        Error::Type(e)
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Build a table holding one row per entity, in input order.
    ///
    /// Any property read failure aborts the whole conversion; no partial
    /// table is returned.
    #[allow(clippy::result_large_err)]
    pub fn to_table<'e, I>(&self, entities: I) -> Result<DataTable>
    where
        I: IntoIterator<Item = &'e M>,
    {
        let mut table = self.schema()?;
        for entity in entities {
            table.add_row(self.row(entity)?)?;
        }
        Ok(table)
    }
}

impl<M: Model> std::fmt::Debug for EntityMapping<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMapping")
            .field("table", &M::TABLE_NAME)
            .field(
                "columns",
                &self.descriptors().map(|d| &d.column_name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
