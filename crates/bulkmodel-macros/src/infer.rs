//! SQL type inference from Rust types.
//!
//! This module provides functions to infer SQL types from Rust types
//! used in Model struct fields.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

/// Infer the SQL type from a Rust type, returning a TokenStream that
/// constructs the appropriate SqlType variant.
///
/// `Option<T>` is unwrapped first: nullability is carried separately, so a
/// nullable column reports its underlying type. The inferred type always
/// accepts whatever `ToValue` produces for the Rust type; types the macro
/// cannot see through become `SqlType::Custom` named after the Rust type.
pub fn infer_sql_type(ty: &Type) -> TokenStream {
    let inner_ty = unwrap_option_type(ty);
    let type_str = type_to_string(inner_ty);

    match type_str.as_str() {
        "bool" => quote! { bulkmodel_core::SqlType::Boolean },

        "i8" => quote! { bulkmodel_core::SqlType::TinyInt },
        "i16" => quote! { bulkmodel_core::SqlType::SmallInt },
        "i32" => quote! { bulkmodel_core::SqlType::Integer },
        "i64" => quote! { bulkmodel_core::SqlType::BigInt },

        // Unsigned integers map to the next larger signed type
        "u8" => quote! { bulkmodel_core::SqlType::SmallInt },
        "u16" => quote! { bulkmodel_core::SqlType::Integer },
        "u32" | "u64" | "usize" => quote! { bulkmodel_core::SqlType::BigInt },

        "f32" => quote! { bulkmodel_core::SqlType::Real },
        "f64" => quote! { bulkmodel_core::SqlType::Double },

        "String" => quote! { bulkmodel_core::SqlType::Text },
        "char" => quote! { bulkmodel_core::SqlType::Char(1) },

        "Vec<u8>" => quote! { bulkmodel_core::SqlType::Blob },
        "[u8;16]" => quote! { bulkmodel_core::SqlType::Uuid },

        "serde_json::Value" => quote! { bulkmodel_core::SqlType::Json },

        // Already-dynamic values: let the transport coerce
        "Value" | "bulkmodel_core::Value" | "bulkmodel::Value" => {
            quote! { bulkmodel_core::SqlType::Custom("SQL_VARIANT") }
        }

        // Aliases and newtypes: the type name is all we see here, so the
        // column accepts whatever `ToValue` produces and the transport
        // coerces.
        _ => quote! { bulkmodel_core::SqlType::Custom(#type_str) },
    }
}

/// Parse an explicit sql_type attribute string into a SqlType TokenStream.
///
/// Supports common SQL type names:
/// - INTEGER, INT, BIGINT, SMALLINT, TINYINT
/// - REAL, FLOAT, DOUBLE, DOUBLE PRECISION
/// - NUMERIC(p,s), DECIMAL(p,s)
/// - BOOLEAN, BOOL, BIT
/// - CHAR(n), VARCHAR(n), NVARCHAR(n), TEXT
/// - BINARY(n), VARBINARY(n), BLOB, BYTEA
/// - DATE, TIME, DATETIME, TIMESTAMP, TIMESTAMPTZ
/// - UUID, UNIQUEIDENTIFIER
/// - JSON, JSONB
pub fn parse_sql_type_attr(sql_type: &str) -> TokenStream {
    let sql_type_upper = sql_type.to_uppercase();
    let trimmed = sql_type_upper.trim();

    if let Some(len) = sized(trimmed, "VARCHAR(").or_else(|| sized(trimmed, "NVARCHAR(")) {
        return quote! { bulkmodel_core::SqlType::VarChar(#len) };
    }
    if let Some(len) = sized(trimmed, "CHAR(").or_else(|| sized(trimmed, "NCHAR(")) {
        return quote! { bulkmodel_core::SqlType::Char(#len) };
    }
    if let Some(len) = sized(trimmed, "VARBINARY(") {
        return quote! { bulkmodel_core::SqlType::VarBinary(#len) };
    }
    if let Some(len) = sized(trimmed, "BINARY(") {
        return quote! { bulkmodel_core::SqlType::Binary(#len) };
    }
    if let Some((p, s)) = precision_scale(trimmed, "NUMERIC(") {
        return quote! { bulkmodel_core::SqlType::Numeric { precision: #p, scale: #s } };
    }
    if let Some((p, s)) = precision_scale(trimmed, "DECIMAL(") {
        return quote! { bulkmodel_core::SqlType::Decimal { precision: #p, scale: #s } };
    }

    match trimmed {
        "TINYINT" => quote! { bulkmodel_core::SqlType::TinyInt },
        "SMALLINT" | "INT2" => quote! { bulkmodel_core::SqlType::SmallInt },
        "INTEGER" | "INT" | "INT4" => quote! { bulkmodel_core::SqlType::Integer },
        "BIGINT" | "INT8" => quote! { bulkmodel_core::SqlType::BigInt },

        "REAL" | "FLOAT4" => quote! { bulkmodel_core::SqlType::Real },
        "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" | "FLOAT" => {
            quote! { bulkmodel_core::SqlType::Double }
        }

        "NUMERIC" => quote! { bulkmodel_core::SqlType::Numeric { precision: 38, scale: 18 } },
        "DECIMAL" => quote! { bulkmodel_core::SqlType::Decimal { precision: 38, scale: 18 } },

        "BOOLEAN" | "BOOL" | "BIT" => quote! { bulkmodel_core::SqlType::Boolean },

        "TEXT" | "NTEXT" => quote! { bulkmodel_core::SqlType::Text },
        "VARCHAR" | "NVARCHAR" => quote! { bulkmodel_core::SqlType::VarChar(255) },
        "CHAR" | "NCHAR" => quote! { bulkmodel_core::SqlType::Char(1) },

        "BLOB" | "BYTEA" => quote! { bulkmodel_core::SqlType::Blob },
        "BINARY" => quote! { bulkmodel_core::SqlType::Binary(255) },
        "VARBINARY" => quote! { bulkmodel_core::SqlType::VarBinary(255) },

        "DATE" => quote! { bulkmodel_core::SqlType::Date },
        "TIME" => quote! { bulkmodel_core::SqlType::Time },
        "DATETIME" | "DATETIME2" => quote! { bulkmodel_core::SqlType::DateTime },
        "TIMESTAMP" => quote! { bulkmodel_core::SqlType::Timestamp },
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" | "DATETIMEOFFSET" => {
            quote! { bulkmodel_core::SqlType::TimestampTz }
        }

        "UUID" | "UNIQUEIDENTIFIER" => quote! { bulkmodel_core::SqlType::Uuid },

        "JSON" => quote! { bulkmodel_core::SqlType::Json },
        "JSONB" => quote! { bulkmodel_core::SqlType::JsonB },

        // Unknown: use custom type, original case
        _ => {
            let custom = sql_type;
            quote! { bulkmodel_core::SqlType::Custom(#custom) }
        }
    }
}

/// Parse `PREFIX<n>)` into `n`.
fn sized(sql_type: &str, prefix: &str) -> Option<u32> {
    sql_type
        .strip_prefix(prefix)?
        .strip_suffix(')')?
        .trim()
        .parse()
        .ok()
}

/// Parse `PREFIX<p>, <s>)` into `(p, s)`.
fn precision_scale(sql_type: &str, prefix: &str) -> Option<(u8, u8)> {
    let params = sql_type.strip_prefix(prefix)?.strip_suffix(')')?;
    let (p, s) = params.split_once(',')?;
    Some((p.trim().parse().ok()?, s.trim().parse().ok()?))
}

/// Unwrap Option<T> to get the inner type, or return the original type.
fn unwrap_option_type(ty: &Type) -> &Type {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return inner;
                    }
                }
            }
        }
    }
    ty
}

/// Convert a Type to a simplified string representation for matching.
fn type_to_string(ty: &Type) -> String {
    use quote::ToTokens;
    ty.to_token_stream().to_string().replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_infer_primitives() {
        let ty: Type = parse_quote!(i32);
        assert!(infer_sql_type(&ty).to_string().contains("Integer"));

        let ty: Type = parse_quote!(i64);
        assert!(infer_sql_type(&ty).to_string().contains("BigInt"));

        let ty: Type = parse_quote!(bool);
        assert!(infer_sql_type(&ty).to_string().contains("Boolean"));
    }

    #[test]
    fn test_infer_option_uses_underlying_type() {
        let ty: Type = parse_quote!(Option<i32>);
        let result = infer_sql_type(&ty).to_string();
        assert!(result.contains("Integer"));
        assert!(!result.contains("Option"));
    }

    #[test]
    fn test_infer_bytes_and_uuid() {
        let ty: Type = parse_quote!(Vec<u8>);
        assert!(infer_sql_type(&ty).to_string().contains("Blob"));

        let ty: Type = parse_quote!([u8; 16]);
        assert!(infer_sql_type(&ty).to_string().contains("Uuid"));
    }

    #[test]
    fn test_infer_unknown_type_is_custom() {
        let ty: Type = parse_quote!(PersonId);
        let result = infer_sql_type(&ty).to_string();
        assert!(result.contains("Custom"));
        assert!(result.contains("\"PersonId\""));
        assert!(!result.contains("Text"));

        let ty: Type = parse_quote!(Option<crate::ids::Sku>);
        assert!(infer_sql_type(&ty).to_string().contains("\"crate::ids::Sku\""));
    }

    #[test]
    fn test_parse_sql_type_varchar() {
        let result = parse_sql_type_attr("nvarchar(100)").to_string();
        assert!(result.contains("VarChar"));
        assert!(result.contains("100"));
    }

    #[test]
    fn test_parse_sql_type_decimal() {
        let result = parse_sql_type_attr("DECIMAL(10, 2)").to_string();
        assert!(result.contains("Decimal"));
        assert!(result.contains("10"));
    }

    #[test]
    fn test_parse_sql_type_custom_keeps_case() {
        let result = parse_sql_type_attr("geography").to_string();
        assert!(result.contains("Custom"));
        assert!(result.contains("\"geography\""));
    }
}
