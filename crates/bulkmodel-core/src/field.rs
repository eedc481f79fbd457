//! Field and column definitions.

use crate::Result;
use crate::types::SqlType;
use crate::value::Value;

/// Metadata about a model field/column.
///
/// This is the static half of an entity's mapping: what the database knows
/// about a column. The other half, how to read the column's value off an
/// entity, is the matching [`FieldAccessor`].
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Database column name (may differ from field name)
    pub column_name: &'static str,
    /// SQL type for this field (never wrapped for nullability)
    pub sql_type: SqlType,
    /// Whether this field is nullable
    pub nullable: bool,
    /// Whether this is a primary key
    pub primary_key: bool,
}

impl FieldInfo {
    /// Create a new field info with minimal required data.
    pub const fn new(name: &'static str, column_name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            column_name,
            sql_type,
            nullable: false,
            primary_key: false,
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }
}

/// Reads one field of a `M` as a [`Value`].
///
/// Generated by `#[derive(Model)]` as a static table, one entry per mapped
/// field, so that column values are read through plain function pointers
/// instead of being looked up by name on every row.
pub struct FieldAccessor<M> {
    /// Rust field name; matches [`FieldInfo::name`].
    pub name: &'static str,
    get: fn(&M) -> Result<Value>,
}

impl<M> FieldAccessor<M> {
    /// Create a new accessor.
    pub const fn new(name: &'static str, get: fn(&M) -> Result<Value>) -> Self {
        Self { name, get }
    }

    /// Read the field from an entity.
    #[allow(clippy::result_large_err)]
    pub fn get(&self, entity: &M) -> Result<Value> {
        (self.get)(entity)
    }

    /// The raw accessor function.
    pub fn function(&self) -> fn(&M) -> Result<Value> {
        self.get
    }
}

impl<M> Clone for FieldAccessor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldAccessor<M> {}

impl<M> std::fmt::Debug for FieldAccessor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
    }

    fn get_x(p: &Point) -> Result<Value> {
        Ok(Value::Int(p.x))
    }

    #[test]
    fn field_info_builder() {
        let info = FieldInfo::new("age", "age", SqlType::Integer)
            .column("Age")
            .nullable(true)
            .primary_key(false);
        assert_eq!(info.name, "age");
        assert_eq!(info.column_name, "Age");
        assert_eq!(info.sql_type, SqlType::Integer);
        assert!(info.nullable);
        assert!(!info.primary_key);
    }

    #[test]
    fn accessor_reads_field() {
        static ACCESSORS: &[FieldAccessor<Point>] = &[FieldAccessor::new("x", get_x)];
        let p = Point { x: 42 };
        assert_eq!(ACCESSORS[0].get(&p).unwrap(), Value::Int(42));
        assert_eq!(ACCESSORS[0].name, "x");
        assert!(format!("{:?}", ACCESSORS[0]).contains("\"x\""));
    }
}
