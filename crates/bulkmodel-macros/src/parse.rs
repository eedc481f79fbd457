//! `#[bulkmodel(...)]` attribute parsing.
//!
//! Turns the derive input into a [`ModelDef`]: table name, mapped fields
//! with their column names and SQL type overrides, and the primary key
//! (explicit, or the implicit `id` field).

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Generics, Ident, Lit, Result, Type};

/// Parsed model definition from a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    /// The struct name (e.g., `Person`).
    pub name: Ident,
    /// The SQL table name (e.g., `"people"`).
    pub table_name: String,
    /// Parsed field definitions, skipped fields included.
    pub fields: Vec<FieldDef>,
    /// Generic parameters from the struct.
    pub generics: Generics,
}

/// Parsed field definition from a struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// The Rust field name (e.g., `full_name`).
    pub name: Ident,
    /// The SQL column name (e.g., `"full_name"` or custom override).
    pub column_name: String,
    /// The Rust type of the field.
    pub ty: Type,
    /// Optional SQL type override (e.g., `"VARCHAR(100)"`).
    pub sql_type: Option<String>,
    /// Whether the field allows NULL values.
    pub nullable: bool,
    /// Whether this field is (part of) the primary key.
    pub primary_key: bool,
    /// Skip this field entirely in bulk operations.
    pub skip: bool,
}

impl FieldDef {
    /// Property name as seen by the column catalog (raw identifiers unescaped).
    pub fn property_name(&self) -> String {
        self.name.unraw().to_string()
    }
}

impl ModelDef {
    /// Returns the fields that are part of the primary key.
    pub fn primary_key_fields(&self) -> Vec<&FieldDef> {
        self.mapped_fields()
            .into_iter()
            .filter(|f| f.primary_key)
            .collect()
    }

    /// Returns the fields that map to a column, in declaration order.
    pub fn mapped_fields(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| !f.skip).collect()
    }
}

/// Parse a `DeriveInput` into a `ModelDef`.
///
/// Returns an error if:
/// - The input is not a struct
/// - The struct uses tuple or unit syntax (must have named fields)
/// - Unknown attributes are present
/// - Attribute values are invalid
pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();

    let table_name = parse_struct_attrs(&input.attrs, &name)?;

    let mut fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    // Without an explicit key, a mapped field named `id` is the primary key.
    if !fields.iter().any(|f| f.primary_key) {
        if let Some(id) = fields.iter_mut().find(|f| !f.skip && f.name == "id") {
            id.primary_key = true;
        }
    }

    Ok(ModelDef {
        name,
        table_name,
        fields,
        generics,
    })
}

/// Parse struct-level `#[bulkmodel(...)]` attributes.
///
/// Supported keys:
/// - `table = "name"` (overrides derived table name)
fn parse_struct_attrs(attrs: &[Attribute], struct_name: &Ident) -> Result<String> {
    let mut table_name: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("bulkmodel") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit_str) = value {
                    if table_name.is_some() {
                        return Err(Error::new_spanned(
                            meta.path,
                            "duplicate bulkmodel attribute: table",
                        ));
                    }
                    table_name = Some(lit_str.value());
                    Ok(())
                } else {
                    Err(Error::new_spanned(
                        value,
                        "expected string literal for table name",
                    ))
                }
            } else {
                Err(Error::new_spanned(
                    meta.path,
                    "unknown bulkmodel struct attribute (supported: table)",
                ))
            }
        })?;
    }

    Ok(table_name.unwrap_or_else(|| derive_table_name(&struct_name.unraw().to_string())))
}

/// Derive table name from struct name: convert to snake_case and pluralize.
///
/// Examples:
/// - `Order` -> `orders`
/// - `LineItem` -> `line_items`
/// - `Person` -> `people`
/// - `Category` -> `categories`
fn derive_table_name(struct_name: &str) -> String {
    let snake = to_snake_case(struct_name);
    pluralize(&snake)
}

/// Convert PascalCase to snake_case.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next = chars.get(i + 1).copied();

                // Word boundary, or the last capital of an acronym (`HTTPServer`).
                let should_underscore = prev.is_lowercase()
                    || (prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase()));

                if should_underscore {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Simple English pluralization.
fn pluralize(word: &str) -> String {
    match word {
        "person" => return "people".to_string(),
        "child" => return "children".to_string(),
        "man" => return "men".to_string(),
        "woman" => return "women".to_string(),
        "mouse" => return "mice".to_string(),
        "datum" => return "data".to_string(),
        "index" => return "indices".to_string(),
        "analysis" => return "analyses".to_string(),
        _ => {}
    }

    if word.is_empty() {
        return word.to_string();
    }

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }

    if let Some(stripped) = word.strip_suffix('y') {
        if let Some(prev) = stripped.chars().last() {
            if !"aeiou".contains(prev) {
                return format!("{stripped}ies");
            }
        }
        return format!("{word}s");
    }

    if let Some(stripped) = word.strip_suffix("fe") {
        return format!("{stripped}ves");
    }

    if let Some(stripped) = word.strip_suffix('f') {
        return format!("{stripped}ves");
    }

    format!("{word}s")
}

/// Parse all fields from a struct.
fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "Model requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Err(Error::new(
            Span::call_site(),
            "Model requires a struct with fields, not a unit struct",
        )),
    }
}

/// Parse a single field and its attributes.
fn parse_field(field: &Field) -> Result<FieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let ty = field.ty.clone();
    let nullable = is_option_type(&ty);
    let attrs = parse_field_attrs(&field.attrs, &name)?;

    let column_name = attrs
        .column
        .unwrap_or_else(|| name.unraw().to_string());

    Ok(FieldDef {
        name,
        column_name,
        ty,
        sql_type: attrs.sql_type,
        nullable: attrs.nullable || nullable,
        primary_key: attrs.primary_key,
        skip: attrs.skip,
    })
}

/// Intermediate struct for collecting field attributes.
#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    sql_type: Option<String>,
    nullable: bool,
    primary_key: bool,
    skip: bool,
}

/// Parse all `#[bulkmodel(...)]` attributes on a field.
fn parse_field_attrs(attrs: &[Attribute], field_name: &Ident) -> Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("bulkmodel") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("primary_key") {
                result.primary_key = true;
            } else if path.is_ident("nullable") {
                result.nullable = true;
            } else if path.is_ident("skip") {
                result.skip = true;
            } else if path.is_ident("column") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit_str) = value {
                    result.column = Some(lit_str.value());
                } else {
                    return Err(Error::new_spanned(
                        value,
                        "expected string literal for column name",
                    ));
                }
            } else if path.is_ident("sql_type") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit_str) = value {
                    result.sql_type = Some(lit_str.value());
                } else {
                    return Err(Error::new_spanned(
                        value,
                        "expected string literal for sql_type",
                    ));
                }
            } else {
                return Err(Error::new_spanned(
                    path,
                    "unknown bulkmodel field attribute (supported: primary_key, column, \
                     sql_type, nullable, skip)",
                ));
            }
            Ok(())
        })?;
    }

    if result.skip && result.primary_key {
        return Err(Error::new_spanned(
            field_name,
            "cannot use both `skip` and `primary_key` on the same field",
        ));
    }

    Ok(result)
}

/// Check if a type is `Option<T>`.
pub fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
