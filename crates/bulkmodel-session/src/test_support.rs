//! Mock connection and a hand-written model for this crate's unit tests.

use bulkmodel_core::{
    Connection, FieldAccessor, FieldInfo, Model, Result, SqlType, ToValue, TransactionOps, Value,
};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: Option<i64>,
    pub name: String,
}

impl Person {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
        }
    }

    /// A person whose key the database has not assigned yet.
    pub fn unsaved(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

fn person_id(p: &Person) -> Result<Value> {
    p.id.to_value()
}

fn person_name(p: &Person) -> Result<Value> {
    p.name.to_value()
}

impl Model for Person {
    const TABLE_NAME: &'static str = "Person";
    const PRIMARY_KEY: &'static [&'static str] = &["Id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "Id", SqlType::BigInt)
                .nullable(true)
                .primary_key(true),
            FieldInfo::new("name", "Name", SqlType::Text),
        ];
        FIELDS
    }

    fn accessors() -> &'static [FieldAccessor<Self>] {
        static ACCESSORS: &[FieldAccessor<Person>] = &[
            FieldAccessor::new("id", person_id),
            FieldAccessor::new("name", person_name),
        ];
        ACCESSORS
    }
}

/// Counts transaction calls made through a [`MockConnection`].
#[derive(Debug, Default)]
pub struct TxLog {
    pub begun: Cell<u32>,
    pub committed: Cell<u32>,
    pub rolled_back: Cell<u32>,
}

pub struct MockConnection {
    pub active: bool,
    pub fail_begin: bool,
    pub log: Rc<TxLog>,
}

impl MockConnection {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            fail_begin: false,
            log: Rc::new(TxLog::default()),
        }
    }
}

pub struct MockTx {
    log: Rc<TxLog>,
}

impl Connection for MockConnection {
    type Tx = MockTx;

    fn in_transaction(&self) -> bool {
        self.active
    }

    fn begin(&self) -> Result<MockTx> {
        if self.fail_begin {
            return Err(bulkmodel_core::Error::Transaction(
                bulkmodel_core::TransactionError {
                    kind: bulkmodel_core::TransactionErrorKind::BeginFailed,
                    message: "begin refused".to_string(),
                },
            ));
        }
        self.log.begun.set(self.log.begun.get() + 1);
        Ok(MockTx {
            log: Rc::clone(&self.log),
        })
    }
}

impl TransactionOps for MockTx {
    fn commit(self) -> Result<()> {
        self.log.committed.set(self.log.committed.get() + 1);
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.log.rolled_back.set(self.log.rolled_back.get() + 1);
        Ok(())
    }
}
