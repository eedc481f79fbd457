//! Procedural macros for BulkModel Rust.
//!
//! `bulkmodel-macros` is the compile-time codegen layer. `#[derive(Model)]`
//! turns a plain struct into a `bulkmodel_core::Model` by generating two
//! static tables: the column metadata (`FieldInfo`) consumed by column
//! catalogs, and the field accessors (`FieldAccessor`) used to read each
//! column's value off an entity without runtime reflection.
//!
//! These macros are used by application crates via the `bulkmodel` facade.

use proc_macro::TokenStream;
use quote::format_ident;

mod infer;
mod parse;
mod validate;

use parse::{ModelDef, parse_model};

/// Derive macro for the `Model` trait.
///
/// This macro generates:
/// - Table name and primary key metadata
/// - Static field information, one entry per non-skipped field
/// - Static field accessors, one per non-skipped field
///
/// Every mapped field's type must implement `bulkmodel_core::ToValue`.
///
/// # Attributes
///
/// - `#[bulkmodel(table = "name")]` - Override table name (defaults to the
///   pluralized snake_case struct name)
/// - `#[bulkmodel(primary_key)]` - Mark field as (part of) the primary key;
///   without one, a field named `id` is the key
/// - `#[bulkmodel(column = "name")]` - Override column name
/// - `#[bulkmodel(sql_type = "VARCHAR(50)")]` - Override the inferred SQL type
/// - `#[bulkmodel(nullable)]` - Mark field as nullable (implied by `Option<T>`)
/// - `#[bulkmodel(skip)]` - Leave this field out of bulk operations
///
/// # Example
///
/// ```ignore
/// use bulkmodel::Model;
///
/// #[derive(Model)]
/// #[bulkmodel(table = "Person")]
/// struct Person {
///     #[bulkmodel(primary_key, column = "Id")]
///     id: i32,
///
///     #[bulkmodel(column = "Name")]
///     name: String,
///
///     nickname: Option<String>,
///
///     #[bulkmodel(skip)]
///     cached_score: f64,
/// }
/// ```
#[proc_macro_derive(Model, attributes(bulkmodel))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let model = match parse_model(&input) {
        Ok(m) => m,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_model(&model) {
        return e.to_compile_error().into();
    }

    generate_model_impl(&model).into()
}

/// Generate the Model trait implementation from parsed model definition.
fn generate_model_impl(model: &ModelDef) -> proc_macro2::TokenStream {
    let name = &model.name;
    let table_name = &model.table_name;

    let pk_columns: Vec<&str> = model
        .primary_key_fields()
        .iter()
        .map(|f| f.column_name.as_str())
        .collect();

    let field_infos = generate_field_infos(model);
    let (getter_fns, accessor_entries) = generate_accessors(model);

    quote::quote! {
        impl bulkmodel_core::Model for #name {
            const TABLE_NAME: &'static str = #table_name;
            const PRIMARY_KEY: &'static [&'static str] = &[#(#pk_columns),*];

            fn fields() -> &'static [bulkmodel_core::FieldInfo] {
                static FIELDS: &[bulkmodel_core::FieldInfo] = &[
                    #field_infos
                ];
                FIELDS
            }

            fn accessors() -> &'static [bulkmodel_core::FieldAccessor<Self>] {
                #getter_fns

                static ACCESSORS: &[bulkmodel_core::FieldAccessor<#name>] = &[
                    #accessor_entries
                ];
                ACCESSORS
            }
        }
    }
}

/// Generate the static FieldInfo array contents.
fn generate_field_infos(model: &ModelDef) -> proc_macro2::TokenStream {
    let field_ts: Vec<_> = model
        .mapped_fields()
        .into_iter()
        .map(|field| {
            let property = field.property_name();
            let column_name = &field.column_name;
            let nullable = field.nullable;
            let primary_key = field.primary_key;

            let sql_type_ts = match &field.sql_type {
                Some(explicit) => infer::parse_sql_type_attr(explicit),
                None => infer::infer_sql_type(&field.ty),
            };

            quote::quote! {
                bulkmodel_core::FieldInfo::new(#property, #column_name, #sql_type_ts)
                    .nullable(#nullable)
                    .primary_key(#primary_key)
            }
        })
        .collect();

    quote::quote! { #(#field_ts),* }
}

/// Generate one named getter per mapped field plus the accessor table entries.
fn generate_accessors(model: &ModelDef) -> (proc_macro2::TokenStream, proc_macro2::TokenStream) {
    let name = &model.name;
    let mut getters = Vec::new();
    let mut entries = Vec::new();

    for field in model.mapped_fields() {
        let field_ident = &field.name;
        let property = field.property_name();
        let getter = format_ident!("__bulkmodel_get_{}", property);

        getters.push(quote::quote! {
            #[allow(non_snake_case)]
            fn #getter(entity: &#name) -> bulkmodel_core::Result<bulkmodel_core::Value> {
                bulkmodel_core::ToValue::to_value(&entity.#field_ident)
            }
        });
        entries.push(quote::quote! {
            bulkmodel_core::FieldAccessor::new(#property, #getter)
        });
    }

    (
        quote::quote! { #(#getters)* },
        quote::quote! { #(#entries),* },
    )
}
