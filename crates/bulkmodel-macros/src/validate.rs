//! Compile-time validation for Model derive macro.
//!
//! Errors are collected and combined so a struct with several problems
//! reports all of them at once.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{Error, GenericArgument, PathArguments, Type};

use crate::parse::{FieldDef, ModelDef};

/// Validate a parsed model definition.
pub fn validate_model(model: &ModelDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    validate_not_generic(model, &mut errors);
    validate_has_fields(model, &mut errors);
    validate_table_name(&model.table_name, model.name.span(), &mut errors);
    validate_no_duplicate_columns(model, &mut errors);

    for field in model.mapped_fields() {
        validate_field(field, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let mut combined = errors.remove(0);
        for err in errors {
            combined.combine(err);
        }
        Err(combined)
    }
}

/// Field metadata and accessors are `static`, which cannot mention generic
/// parameters.
fn validate_not_generic(model: &ModelDef, errors: &mut Vec<Error>) {
    if !model.generics.params.is_empty() {
        errors.push(Error::new_spanned(
            &model.generics,
            "Model cannot be derived for generic structs",
        ));
    }
}

/// Validate that the struct maps at least one column.
fn validate_has_fields(model: &ModelDef, errors: &mut Vec<Error>) {
    if model.mapped_fields().is_empty() {
        errors.push(Error::new(
            model.name.span(),
            "Model struct must have at least one non-skipped field",
        ));
    }
}

/// Validate that the table name doesn't contain SQL injection characters.
fn validate_table_name(table_name: &str, span: Span, errors: &mut Vec<Error>) {
    const DANGEROUS_CHARS: &[char] = &[';', '\'', '"', '`', '-', '/', '*', '\\', '\0', '\n', '\r'];

    if let Some(ch) = table_name.chars().find(|c| DANGEROUS_CHARS.contains(c)) {
        errors.push(Error::new(
            span,
            format!(
                "table name contains invalid character '{ch}'; \
                 table names should only contain alphanumeric characters and underscores"
            ),
        ));
        return;
    }

    if table_name.trim().is_empty() {
        errors.push(Error::new(span, "table name cannot be empty or whitespace"));
        return;
    }

    if let Some(first) = table_name.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            errors.push(Error::new(
                span,
                format!("table name must start with a letter or underscore, got '{first}'"),
            ));
        }
    }
}

/// Validate that no two non-skipped fields map to the same column name.
fn validate_no_duplicate_columns(model: &ModelDef, errors: &mut Vec<Error>) {
    let mut seen_columns: HashSet<&str> = HashSet::new();

    for field in model.mapped_fields() {
        if !seen_columns.insert(&field.column_name) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate column name '{}'; another field already maps to this column",
                    field.column_name
                ),
            ));
        }
    }
}

/// Validate a single mapped field's type.
fn validate_field(field: &FieldDef, errors: &mut Vec<Error>) {
    let span = field.name.span();

    if is_nested_option(&field.ty) {
        errors.push(Error::new(
            span,
            "nested Option<Option<T>> is ambiguous and not supported; \
             use a single Option<T> or a custom type",
        ));
    }

    if matches!(field.ty, Type::Reference(_)) {
        errors.push(Error::new(
            span,
            "reference types (&T) are not supported; use owned types instead",
        ));
    }

    if matches!(field.ty, Type::Ptr(_)) {
        errors.push(Error::new(
            span,
            "raw pointer types (*const T, *mut T) are not supported; use owned types instead",
        ));
    }
}

/// Check if a type is Option<Option<T>> (nested Option).
fn is_nested_option(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(Type::Path(inner_path))) = args.args.first() {
                        if let Some(inner_seg) = inner_path.path.segments.last() {
                            return inner_seg.ident == "Option";
                        }
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_model;
    use syn::{DeriveInput, parse_quote};

    fn validate(input: DeriveInput) -> Result<(), Error> {
        validate_model(&parse_model(&input).unwrap())
    }

    #[test]
    fn test_is_nested_option() {
        let ty: Type = parse_quote!(Option<Option<i32>>);
        assert!(is_nested_option(&ty));

        let ty: Type = parse_quote!(Option<i32>);
        assert!(!is_nested_option(&ty));
    }

    #[test]
    fn test_validate_table_name() {
        let mut errors = Vec::new();
        validate_table_name("people", Span::call_site(), &mut errors);
        validate_table_name("_staging", Span::call_site(), &mut errors);
        assert!(errors.is_empty());

        validate_table_name("people; DROP TABLE people", Span::call_site(), &mut errors);
        assert_eq!(errors.len(), 1);

        let mut errors = Vec::new();
        validate_table_name("1people", Span::call_site(), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = validate(parse_quote! {
            struct Person {
                id: i64,
                #[bulkmodel(column = "id")]
                other: i64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("duplicate column name"));
    }

    #[test]
    fn test_skipped_duplicate_is_fine() {
        validate(parse_quote! {
            struct Person {
                id: i64,
                #[bulkmodel(skip, column = "id")]
                shadow: i64,
            }
        })
        .unwrap();
    }

    #[test]
    fn test_generic_struct_rejected() {
        let err = validate(parse_quote! {
            struct Wrapper<T> {
                id: i64,
                inner: T,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("generic"));
    }

    #[test]
    fn test_all_skipped_rejected() {
        assert!(
            validate(parse_quote! {
                struct Empty {
                    #[bulkmodel(skip)]
                    cache: Vec<u8>,
                }
            })
            .is_err()
        );
    }

    #[test]
    fn test_reference_field_rejected() {
        assert!(
            validate(parse_quote! {
                struct Borrowed {
                    id: i64,
                    name: &'static str,
                }
            })
            .is_err()
        );
    }
}
