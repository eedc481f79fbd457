//! In-memory tabular buffer handed to bulk-copy transports.
//!
//! A [`DataTable`] is column-oriented metadata plus row-oriented data: an
//! ordered list of typed [`DataColumn`]s and a list of rows whose arity
//! always equals the column count.

use crate::error::{Error, MappingError, MappingErrorKind, Result, TypeError};
use crate::types::SqlType;
use crate::value::Value;
use serde::Serialize;

/// A typed column of a [`DataTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataColumn {
    /// Destination column name.
    pub name: String,
    /// Underlying (non-nullable) SQL type.
    pub sql_type: SqlType,
    /// Whether the destination column accepts NULL.
    pub allow_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl DataColumn {
    /// Create a non-nullable, non-key column.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            allow_null: false,
            primary_key: false,
        }
    }

    /// Set the nullable flag.
    pub fn allow_null(mut self, value: bool) -> Self {
        self.allow_null = value;
        self
    }

    /// Set the primary key flag.
    pub fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }
}

/// Named, typed tabular buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    name: String,
    columns: Vec<DataColumn>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create an empty table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a column.
    ///
    /// Columns must be added before the first row; names are unique.
    #[allow(clippy::result_large_err)]
    pub fn add_column(&mut self, column: DataColumn) -> Result<()> {
        if !self.rows.is_empty() {
            return Err(Error::Custom(format!(
                "cannot add column '{}' to table '{}' after rows were added",
                column.name, self.name
            )));
        }
        if self.column_index(&column.name).is_some() {
            return Err(Error::Mapping(MappingError {
                kind: MappingErrorKind::DuplicateColumn,
                table: self.name.clone(),
                column: Some(column.name.clone()),
                property: None,
                message: format!("duplicate column '{}'", column.name),
            }));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append a row.
    ///
    /// The row must have one value per column, and every non-null value
    /// must be accepted by its column's type.
    #[allow(clippy::result_large_err)]
    pub fn add_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Custom(format!(
                "row has {} values but table '{}' has {} columns",
                row.len(),
                self.name,
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(&row) {
            if !column.sql_type.accepts(value) {
                tracing::debug!(
                    table = %self.name,
                    column = %column.name,
                    value_type = value.type_name(),
                    "value rejected by column type"
                );
                return Err(Error::Type(TypeError {
                    expected: column.sql_type.sql_name(),
                    actual: value.type_name().to_string(),
                    column: Some(column.name.clone()),
                    rust_type: None,
                }));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Columns in order.
    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows (it may still have columns).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
