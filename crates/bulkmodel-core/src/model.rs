//! Model trait for ORM-style struct mapping.
//!
//! The `Model` trait defines the contract for structs that can be
//! mapped to database tables. It is typically derived using the
//! `#[derive(Model)]` macro from `bulkmodel-macros`.

use crate::Result;
use crate::error::{Error, MappingError, MappingErrorKind};
use crate::field::{FieldAccessor, FieldInfo};
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// Both the column metadata and the accessor table are `'static`: they
/// are computed once per type, at compile time, so bulk operations never
/// reflect over an entity at runtime.
///
/// # Example
///
/// ```ignore
/// #[derive(Model)]
/// #[bulkmodel(table = "people")]
/// struct Person {
///     #[bulkmodel(primary_key, column = "Id")]
///     id: i64,
///     #[bulkmodel(column = "Name")]
///     name: String,
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key column name(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Get field metadata for all columns, in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Get the accessor for every mapped field, in declaration order.
    fn accessors() -> &'static [FieldAccessor<Self>];

    /// Find the accessor for a Rust field name.
    fn accessor(name: &str) -> Option<&'static FieldAccessor<Self>> {
        Self::accessors().iter().find(|a| a.name == name)
    }

    /// Convert this model instance to a row of `(column_name, value)` pairs.
    #[allow(clippy::result_large_err)]
    fn to_row(&self) -> Result<Vec<(&'static str, Value)>> {
        Self::fields()
            .iter()
            .map(|field| {
                let accessor = Self::accessor(field.name)
                    .ok_or_else(|| missing_accessor::<Self>(field))?;
                Ok((field.column_name, accessor.get(self)?))
            })
            .collect()
    }

    /// Get the value of the primary key field(s).
    #[allow(clippy::result_large_err)]
    fn primary_key_value(&self) -> Result<Vec<Value>> {
        Self::fields()
            .iter()
            .filter(|field| field.primary_key)
            .map(|field| {
                let accessor = Self::accessor(field.name)
                    .ok_or_else(|| missing_accessor::<Self>(field))?;
                accessor.get(self)
            })
            .collect()
    }

    /// Does this instance carry a usable identity: a primary key with no
    /// NULL component?
    ///
    /// False for key-less models and for keys the database has not
    /// generated yet.
    #[allow(clippy::result_large_err)]
    fn has_primary_key_value(&self) -> Result<bool> {
        let pk = self.primary_key_value()?;
        Ok(!pk.is_empty() && !pk.iter().any(Value::is_null))
    }
}

fn missing_accessor<M: Model>(field: &FieldInfo) -> Error {
    Error::Mapping(MappingError {
        kind: MappingErrorKind::MissingProperty,
        table: M::TABLE_NAME.to_string(),
        column: Some(field.column_name.to_string()),
        property: Some(field.name.to_string()),
        message: format!(
            "no accessor for field '{}' of {}",
            field.name,
            std::any::type_name::<M>()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    struct Person {
        id: i64,
        name: String,
        nickname: Option<String>,
    }

    fn get_id(p: &Person) -> Result<Value> {
        Ok(Value::BigInt(p.id))
    }

    fn get_name(p: &Person) -> Result<Value> {
        Ok(Value::Text(p.name.clone()))
    }

    fn get_nickname(p: &Person) -> Result<Value> {
        Ok(p.nickname.clone().into())
    }

    impl Model for Person {
        const TABLE_NAME: &'static str = "people";
        const PRIMARY_KEY: &'static [&'static str] = &["Id"];

        fn fields() -> &'static [FieldInfo] {
            static FIELDS: &[FieldInfo] = &[
                FieldInfo::new("id", "Id", SqlType::BigInt).primary_key(true),
                FieldInfo::new("name", "Name", SqlType::Text),
                FieldInfo::new("nickname", "Nickname", SqlType::Text).nullable(true),
            ];
            FIELDS
        }

        fn accessors() -> &'static [FieldAccessor<Self>] {
            static ACCESSORS: &[FieldAccessor<Person>] = &[
                FieldAccessor::new("id", get_id),
                FieldAccessor::new("name", get_name),
                FieldAccessor::new("nickname", get_nickname),
            ];
            ACCESSORS
        }
    }

    // A model whose metadata names a field it has no accessor for.
    struct Broken;

    impl Model for Broken {
        const TABLE_NAME: &'static str = "broken";
        const PRIMARY_KEY: &'static [&'static str] = &["Id"];

        fn fields() -> &'static [FieldInfo] {
            static FIELDS: &[FieldInfo] =
                &[FieldInfo::new("id", "Id", SqlType::BigInt).primary_key(true)];
            FIELDS
        }

        fn accessors() -> &'static [FieldAccessor<Self>] {
            &[]
        }
    }

    #[test]
    fn test_to_row_uses_column_names_in_order() {
        let p = Person {
            id: 1,
            name: "A".to_string(),
            nickname: None,
        };
        let row = p.to_row().unwrap();
        assert_eq!(
            row,
            vec![
                ("Id", Value::BigInt(1)),
                ("Name", Value::Text("A".to_string())),
                ("Nickname", Value::Null),
            ]
        );
    }

    #[test]
    fn test_primary_key_value() {
        let p = Person {
            id: 7,
            name: "B".to_string(),
            nickname: Some("bee".to_string()),
        };
        assert_eq!(p.primary_key_value().unwrap(), vec![Value::BigInt(7)]);
    }

    #[test]
    fn test_has_primary_key_value() {
        let p = Person {
            id: 7,
            name: "B".to_string(),
            nickname: None,
        };
        assert!(p.has_primary_key_value().unwrap());
        assert!(Broken.has_primary_key_value().is_err());
    }

    #[test]
    fn test_accessor_lookup_is_case_sensitive() {
        assert!(Person::accessor("name").is_some());
        assert!(Person::accessor("Name").is_none());
    }

    #[test]
    fn test_missing_accessor_is_mapping_error() {
        let err = Broken.primary_key_value().unwrap_err();
        assert_eq!(err.mapping_kind(), Some(MappingErrorKind::MissingProperty));
        assert!(Broken.to_row().is_err());
    }
}
