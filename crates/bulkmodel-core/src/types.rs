//! SQL type definitions and mapping.

use crate::value::Value;
use serde::Serialize;

/// SQL data types supported by BulkModel.
///
/// A `SqlType` never encodes nullability: a nullable column carries its
/// underlying type here and the nullability separately (see
/// [`FieldInfo::nullable`](crate::FieldInfo) and
/// [`DataColumn::allow_null`](crate::DataColumn)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SqlType {
    // Integer types
    TinyInt,
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,

    // Fixed precision
    Numeric { precision: u8, scale: u8 },
    Decimal { precision: u8, scale: u8 },

    // Boolean
    Boolean,

    // String types
    Char(u32),
    VarChar(u32),
    Text,

    // Binary types
    Binary(u32),
    VarBinary(u32),
    Blob,

    // Date/time types
    Date,
    Time,
    DateTime,
    Timestamp,
    TimestampTz,

    // UUID
    Uuid,

    // JSON
    Json,
    JsonB,

    // Arrays (PostgreSQL)
    Array(Box<SqlType>),

    // Custom type name
    Custom(&'static str),
}

impl SqlType {
    /// Get the SQL type name for this type.
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::TinyInt => "TINYINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Numeric { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Char(len) => format!("CHAR({})", len),
            SqlType::VarChar(len) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Binary(len) => format!("BINARY({})", len),
            SqlType::VarBinary(len) => format!("VARBINARY({})", len),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::TimestampTz => "TIMESTAMPTZ".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::JsonB => "JSONB".to_string(),
            SqlType::Array(inner) => format!("{}[]", inner.sql_name()),
            SqlType::Custom(name) => name.to_string(),
        }
    }

    /// Check whether a value can be stored in a column of this type.
    ///
    /// `Null` and `Default` are accepted everywhere. Integers widen into any
    /// wider integer or any floating/fixed-precision type; `Custom` columns
    /// accept anything and leave coercion to the transport.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null | Value::Default) | (SqlType::Custom(_), _) => true,

            (SqlType::Boolean, Value::Bool(_)) => true,

            (SqlType::TinyInt, Value::TinyInt(_)) => true,
            (SqlType::SmallInt, Value::TinyInt(_) | Value::SmallInt(_)) => true,
            (SqlType::Integer, Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_)) => true,
            (
                SqlType::BigInt,
                Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_),
            ) => true,

            (
                SqlType::Real
                | SqlType::Double
                | SqlType::Numeric { .. }
                | SqlType::Decimal { .. },
                Value::TinyInt(_)
                | Value::SmallInt(_)
                | Value::Int(_)
                | Value::BigInt(_)
                | Value::Float(_)
                | Value::Double(_)
                | Value::Decimal(_),
            ) => true,

            (SqlType::Char(_) | SqlType::VarChar(_) | SqlType::Text, Value::Text(_)) => true,

            (
                SqlType::Binary(_) | SqlType::VarBinary(_) | SqlType::Blob,
                Value::Bytes(_),
            ) => true,

            (SqlType::Date, Value::Date(_)) => true,
            (SqlType::Time, Value::Time(_)) => true,
            (SqlType::DateTime | SqlType::Timestamp, Value::Timestamp(_)) => true,
            (SqlType::TimestampTz, Value::TimestampTz(_) | Value::Timestamp(_)) => true,

            (SqlType::Uuid, Value::Uuid(_)) => true,

            (SqlType::Json | SqlType::JsonB, Value::Json(_) | Value::Text(_)) => true,

            (SqlType::Array(inner), Value::Array(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }

            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_accepted_by_every_type() {
        for ty in [
            SqlType::Integer,
            SqlType::Text,
            SqlType::Blob,
            SqlType::Uuid,
            SqlType::Array(Box::new(SqlType::BigInt)),
        ] {
            assert!(ty.accepts(&Value::Null), "{} rejected NULL", ty.sql_name());
        }
    }

    #[test]
    fn integers_widen_but_do_not_narrow() {
        assert!(SqlType::BigInt.accepts(&Value::Int(1)));
        assert!(SqlType::Integer.accepts(&Value::SmallInt(1)));
        assert!(!SqlType::Integer.accepts(&Value::BigInt(1)));
        assert!(!SqlType::TinyInt.accepts(&Value::SmallInt(1)));
        assert!(SqlType::Double.accepts(&Value::BigInt(1)));
    }

    #[test]
    fn text_and_binary_families() {
        assert!(SqlType::VarChar(10).accepts(&Value::Text("abc".into())));
        assert!(!SqlType::Text.accepts(&Value::Int(1)));
        assert!(SqlType::Blob.accepts(&Value::Bytes(vec![1])));
        assert!(!SqlType::Blob.accepts(&Value::Text("abc".into())));
    }

    #[test]
    fn arrays_check_elements() {
        let ty = SqlType::Array(Box::new(SqlType::BigInt));
        assert!(ty.accepts(&Value::Array(vec![Value::BigInt(1), Value::Int(2)])));
        assert!(!ty.accepts(&Value::Array(vec![Value::Text("x".into())])));
    }

    #[test]
    fn custom_accepts_anything() {
        assert!(SqlType::Custom("GEOGRAPHY").accepts(&Value::Bytes(vec![0])));
    }

    #[test]
    fn sql_names() {
        assert_eq!(SqlType::BigInt.sql_name(), "BIGINT");
        assert_eq!(
            SqlType::Decimal {
                precision: 10,
                scale: 2
            }
            .sql_name(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(
            SqlType::Array(Box::new(SqlType::Text)).sql_name(),
            "TEXT[]"
        );
    }
}
