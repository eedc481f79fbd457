//! Column catalogs: which columns an entity type maps to.
//!
//! The catalog is the metadata collaborator of the table adapter. It is
//! asked once per conversion for the ordered list of columns of an entity
//! type, optionally restricted to the primary key.

use bulkmodel_core::{Error, FieldInfo, MappingError, MappingErrorKind, Model, Result, SqlType};
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;

/// One mapped column of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// Name of the entity property the value is read from.
    pub property_name: String,
    /// Destination column name.
    pub column_name: String,
    /// Underlying SQL type; nullability is carried by `nullable`.
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl From<&FieldInfo> for ColumnDescriptor {
    fn from(field: &FieldInfo) -> Self {
        Self {
            property_name: field.name.to_string(),
            column_name: field.column_name.to_string(),
            sql_type: field.sql_type.clone(),
            nullable: field.nullable,
            primary_key: field.primary_key,
        }
    }
}

/// Source of column metadata for entity types.
pub trait ColumnCatalog {
    /// Ordered columns of `M`, or only its primary-key columns.
    ///
    /// Fails with a mapping error when `M` has no mapped columns, or when
    /// `primary_keys_only` is set and `M` has no primary key.
    #[allow(clippy::result_large_err)]
    fn columns<M: Model>(&self, primary_keys_only: bool) -> Result<Vec<ColumnDescriptor>>;
}

impl<C: ColumnCatalog + ?Sized> ColumnCatalog for &C {
    fn columns<M: Model>(&self, primary_keys_only: bool) -> Result<Vec<ColumnDescriptor>> {
        (**self).columns::<M>(primary_keys_only)
    }
}

/// Catalog backed by the derive-generated [`Model::fields`] metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelCatalog;

impl ColumnCatalog for ModelCatalog {
    fn columns<M: Model>(&self, primary_keys_only: bool) -> Result<Vec<ColumnDescriptor>> {
        select_columns::<M>(
            M::fields().iter().map(ColumnDescriptor::from).collect(),
            primary_keys_only,
        )
    }
}

/// Catalog that renames destination columns on top of [`Model::fields`].
///
/// Useful when the staging or destination table does not share the
/// entity's column names. Overrides are keyed by entity type and property
/// name, so two types mapped to the same table keep separate renames;
/// properties without an override keep their mapped column name.
#[derive(Debug, Clone, Default)]
pub struct OverrideCatalog {
    overrides: HashMap<(TypeId, String), String>,
}

impl OverrideCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `property` of entity type `M` to `column`.
    pub fn rename<M: Model>(mut self, property: &str, column: impl Into<String>) -> Self {
        self.overrides.insert(
            (TypeId::of::<M>(), property.to_string()),
            column.into(),
        );
        self
    }
}

impl ColumnCatalog for OverrideCatalog {
    fn columns<M: Model>(&self, primary_keys_only: bool) -> Result<Vec<ColumnDescriptor>> {
        let columns = M::fields()
            .iter()
            .map(|field| {
                let mut descriptor = ColumnDescriptor::from(field);
                let key = (TypeId::of::<M>(), descriptor.property_name.clone());
                if let Some(column) = self.overrides.get(&key) {
                    descriptor.column_name.clone_from(column);
                }
                descriptor
            })
            .collect();
        select_columns::<M>(columns, primary_keys_only)
    }
}

/// Apply the shared catalog rules to a full column list.
#[allow(clippy::result_large_err)]
fn select_columns<M: Model>(
    columns: Vec<ColumnDescriptor>,
    primary_keys_only: bool,
) -> Result<Vec<ColumnDescriptor>> {
    if columns.is_empty() {
        return Err(mapping_error::<M>(
            MappingErrorKind::NoColumns,
            format!("{} maps no columns", std::any::type_name::<M>()),
        ));
    }

    if !primary_keys_only {
        return Ok(columns);
    }

    let keys: Vec<_> = columns.into_iter().filter(|c| c.primary_key).collect();
    if keys.is_empty() {
        return Err(mapping_error::<M>(
            MappingErrorKind::NoPrimaryKey,
            format!("{} has no primary key columns", std::any::type_name::<M>()),
        ));
    }
    Ok(keys)
}

fn mapping_error<M: Model>(kind: MappingErrorKind, message: String) -> Error {
    Error::Mapping(MappingError {
        kind,
        table: M::TABLE_NAME.to_string(),
        column: None,
        property: None,
        message,
    })
}
