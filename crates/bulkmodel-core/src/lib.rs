//! Core types and traits for BulkModel Rust.
//!
//! This crate provides the foundational abstractions shared by the bulk
//! helpers:
//!
//! - `Model` trait and `FieldAccessor` for static struct-to-column mapping
//! - `Value` / `SqlType` for typed cell data
//! - `DataTable` as the buffer handed to bulk-copy transports
//! - `Connection` trait for transaction queries against the driver

pub mod connection;
pub mod error;
pub mod field;
pub mod model;
pub mod table;
pub mod types;
pub mod value;

pub use connection::{Connection, TransactionOps};
pub use error::{
    BulkCopyError, ConnectionError, ConnectionErrorKind, Error, MappingError, MappingErrorKind,
    Result, TrackingError, TrackingErrorKind, TransactionError, TransactionErrorKind, TypeError,
};
pub use field::{FieldAccessor, FieldInfo};
pub use model::Model;
pub use table::{DataColumn, DataTable};
pub use types::SqlType;
pub use value::{ToValue, Value};
