//! Entity-to-table conversion for BulkModel Rust.
//!
//! `bulkmodel-copy` turns a collection of mapped entities into the
//! [`DataTable`](bulkmodel_core::DataTable) a bulk-copy transport streams to
//! the server:
//!
//! - [`ColumnCatalog`] supplies the ordered columns of an entity type.
//! - [`EntityMapping`] resolves those columns against the entity's static
//!   accessors once, then reads rows.
//! - [`to_data_table`] is the one-call form of the two.
//! - [`BulkCopy`] is the driver seam that receives the table.

pub mod adapter;
pub mod catalog;
pub mod mapping;
pub mod transport;

#[cfg(test)]
mod test_models;

pub use adapter::to_data_table;
pub use catalog::{ColumnCatalog, ColumnDescriptor, ModelCatalog, OverrideCatalog};
pub use mapping::EntityMapping;
pub use transport::{BulkCopy, BulkCopyFlags, BulkCopyOptions, BulkOperation, ColumnMappingMode};
