//! Hand-written models shared by this crate's unit tests.

use bulkmodel_core::{FieldAccessor, FieldInfo, Model, Result, SqlType, ToValue, Value};

pub struct Person {
    pub id: i32,
    pub name: String,
    pub nickname: Option<String>,
}

impl Person {
    pub fn new(id: i32, name: &str, nickname: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
        }
    }
}

fn person_id(p: &Person) -> Result<Value> {
    p.id.to_value()
}

fn person_name(p: &Person) -> Result<Value> {
    p.name.to_value()
}

fn person_nickname(p: &Person) -> Result<Value> {
    p.nickname.to_value()
}

impl Model for Person {
    const TABLE_NAME: &'static str = "Person";
    const PRIMARY_KEY: &'static [&'static str] = &["Id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "Id", SqlType::Integer).primary_key(true),
            FieldInfo::new("name", "Name", SqlType::Text),
            FieldInfo::new("nickname", "Nickname", SqlType::Text).nullable(true),
        ];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<Person>] = &[
            FieldAccessor::new("id", person_id),
            FieldAccessor::new("name", person_name),
            FieldAccessor::new("nickname", person_nickname),
        ];
        ACCESSORS
    }
}

/// Maps no columns at all.
pub struct Unmapped;

impl Model for Unmapped {
    const TABLE_NAME: &'static str = "unmapped";
    const PRIMARY_KEY: &'static [&'static str] = &[];

    fn fields() -> &'static [FieldInfo] {
        &[]
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        &[]
    }
}

/// Has columns but no primary key.
pub struct Keyless {
    pub message: String,
}

fn keyless_message(k: &Keyless) -> Result<Value> {
    k.message.to_value()
}

impl Model for Keyless {
    const TABLE_NAME: &'static str = "log_lines";
    const PRIMARY_KEY: &'static [&'static str] = &[];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("message", "message", SqlType::Text)];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<Keyless>] =
            &[FieldAccessor::new("message", keyless_message)];
        ACCESSORS
    }
}

/// Metadata names property `Label`, but the accessor is `label`.
pub struct Mismatched {
    pub id: i64,
    pub label: String,
}

fn mismatched_id(m: &Mismatched) -> Result<Value> {
    m.id.to_value()
}

fn mismatched_label(m: &Mismatched) -> Result<Value> {
    m.label.to_value()
}

impl Model for Mismatched {
    const TABLE_NAME: &'static str = "labels";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id", SqlType::BigInt).primary_key(true),
            FieldInfo::new("Label", "label", SqlType::Text),
        ];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<Mismatched>] = &[
            FieldAccessor::new("id", mismatched_id),
            FieldAccessor::new("label", mismatched_label),
        ];
        ACCESSORS
    }
}

/// Has a `u64` column whose values can overflow BIGINT.
pub struct Counter {
    pub id: i64,
    pub hits: u64,
}

fn counter_id(c: &Counter) -> Result<Value> {
    c.id.to_value()
}

fn counter_hits(c: &Counter) -> Result<Value> {
    c.hits.to_value()
}

impl Model for Counter {
    const TABLE_NAME: &'static str = "counters";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id", SqlType::BigInt).primary_key(true),
            FieldInfo::new("hits", "hits", SqlType::BigInt),
        ];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<Counter>] = &[
            FieldAccessor::new("id", counter_id),
            FieldAccessor::new("hits", counter_hits),
        ];
        ACCESSORS
    }
}

/// Key-only projection mapped to the same table as [`Person`].
pub struct PersonKey {
    pub id: i32,
}

fn person_key_id(p: &PersonKey) -> Result<Value> {
    p.id.to_value()
}

impl Model for PersonKey {
    const TABLE_NAME: &'static str = "Person";
    const PRIMARY_KEY: &'static [&'static str] = &["Id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] =
            &[FieldInfo::new("id", "Id", SqlType::Integer).primary_key(true)];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<PersonKey>] = &[FieldAccessor::new("id", person_key_id)];
        ACCESSORS
    }
}
