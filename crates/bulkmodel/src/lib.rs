//! BulkModel Rust - bulk insert, update and delete for ORM-mapped models.
//!
//! BulkModel streams whole collections of mapped entities to the database
//! through a driver's bulk-copy facility, then tells the persistence context
//! what happened so its tracking set matches the database again:
//!
//! - Compile-time entity mapping with `#[derive(Model)]`
//! - Entity collections converted to column-ordered [`DataTable`]s
//! - Join-or-begin transaction scoping
//! - Post-bulk reconciliation with automatic change detection suspended
//!
//! # Quick Start
//!
//! ```ignore
//! use bulkmodel::prelude::*;
//!
//! #[derive(Model, Debug)]
//! #[bulkmodel(table = "Person")]
//! struct Person {
//!     #[bulkmodel(primary_key, column = "Id")]
//!     id: i32,
//!     #[bulkmodel(column = "Name")]
//!     name: String,
//! }
//!
//! fn load(session: &mut Session<MyConn>, copy: &mut MyBulkCopy) -> Result<()> {
//!     let people = vec![
//!         Person { id: 1, name: "A".into() },
//!         Person { id: 2, name: "B".into() },
//!     ];
//!
//!     let report = bulk_insert(session, copy, &ModelCatalog, &people, &BulkOptions::default())?;
//!     assert_eq!(report.rows_affected, 2);
//!     Ok(())
//! }
//! ```

pub mod bulk;

pub use bulk::{BulkOptions, BulkReport, bulk_delete, bulk_insert, bulk_update};

pub use bulkmodel_core::{
    BulkCopyError, Connection, DataColumn, DataTable, Error, FieldAccessor, FieldInfo,
    MappingError, MappingErrorKind, Model, Result, SqlType, ToValue, TrackingError,
    TrackingErrorKind, TransactionError, TransactionErrorKind, TransactionOps, TypeError, Value,
};

pub use bulkmodel_macros::Model;

pub use bulkmodel_copy::{
    BulkCopy, BulkCopyFlags, BulkCopyOptions, BulkOperation, ColumnCatalog, ColumnDescriptor,
    ColumnMappingMode, EntityMapping, ModelCatalog, OverrideCatalog, to_data_table,
};

pub use bulkmodel_session::{
    AutoDetectChangesGuard, ChangeTracker, EntityState, ObjectKey, PersistenceContext, Session,
    SessionConfig, SessionStats, StateCounts, TransactionScope, detach, ensure_transaction,
    mark_unchanged,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bulk::{BulkOptions, BulkReport, bulk_delete, bulk_insert, bulk_update};
    pub use bulkmodel_copy::{
        BulkCopy, BulkCopyFlags, BulkCopyOptions, BulkOperation, ColumnCatalog, ModelCatalog,
        to_data_table,
    };
    pub use bulkmodel_core::{
        Connection, DataTable, Error, Model, Result, SqlType, TransactionOps, Value,
    };
    pub use bulkmodel_macros::Model;
    pub use bulkmodel_session::{
        EntityState, PersistenceContext, Session, SessionConfig, detach, ensure_transaction,
        mark_unchanged,
    };
}
