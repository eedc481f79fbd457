//! Bulk-copy transport abstraction and its options.
//!
//! The transport is the driver component that streams a [`DataTable`] to
//! the server. This crate only defines the seam; drivers implement
//! [`BulkCopy`].

use bitflags::bitflags;
use bulkmodel_core::{DataTable, Result};
use serde::Serialize;
use std::time::Duration;

/// What the server should do with the streamed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BulkOperation {
    /// Insert every row.
    Insert,
    /// Update the rows matching each row's primary key.
    Update,
    /// Delete the rows matching each row's primary key.
    Delete,
}

impl BulkOperation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Delete => "delete",
        }
    }

    /// Does this operation only need the primary-key columns?
    pub const fn primary_keys_only(&self) -> bool {
        matches!(self, BulkOperation::Delete)
    }
}

impl std::fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How table columns are matched to destination columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ColumnMappingMode {
    /// Match by column name.
    #[default]
    ByName,
    /// Match by position. Valid because table columns always follow catalog
    /// order.
    ByOrdinal,
}

bitflags! {
    /// Server-side behaviour switches for a bulk copy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BulkCopyFlags: u32 {
        /// Preserve source identity values instead of letting the server assign them.
        const KEEP_IDENTITY     = 0b0000_0001;
        /// Check constraints while rows are inserted.
        const CHECK_CONSTRAINTS = 0b0000_0010;
        /// Take a bulk update lock on the table instead of row locks.
        const TABLE_LOCK        = 0b0000_0100;
        /// Keep NULLs even where the column has a default.
        const KEEP_NULLS        = 0b0000_1000;
        /// Fire insert triggers on the destination table.
        const FIRE_TRIGGERS     = 0b0001_0000;
    }
}

/// Options passed through to the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkCopyOptions {
    /// Rows per batch sent to the server; 0 sends everything in one batch.
    pub batch_size: usize,
    /// Per-operation timeout the transport should honour, if any.
    pub timeout: Option<Duration>,
    pub column_mapping: ColumnMappingMode,
    pub flags: BulkCopyFlags,
}

impl BulkCopyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows;
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the column mapping mode.
    pub fn column_mapping(mut self, mode: ColumnMappingMode) -> Self {
        self.column_mapping = mode;
        self
    }

    /// Add flags.
    pub fn flags(mut self, flags: BulkCopyFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Number of batches needed for `rows` rows.
    pub fn batch_count(&self, rows: usize) -> usize {
        if rows == 0 {
            0
        } else if self.batch_size == 0 {
            1
        } else {
            rows.div_ceil(self.batch_size)
        }
    }
}

/// A driver's bulk-copy stream.
pub trait BulkCopy {
    /// Stream `table` to the server as `operation`, returning the number of
    /// rows the server reports as affected.
    #[allow(clippy::result_large_err)]
    fn write_to_server(
        &mut self,
        operation: BulkOperation,
        table: &DataTable,
        options: &BulkCopyOptions,
    ) -> Result<u64>;
}

impl<T: BulkCopy + ?Sized> BulkCopy for &mut T {
    fn write_to_server(
        &mut self,
        operation: BulkOperation,
        table: &DataTable,
        options: &BulkCopyOptions,
    ) -> Result<u64> {
        (**self).write_to_server(operation, table, options)
    }
}

impl<T: BulkCopy + ?Sized> BulkCopy for Box<T> {
    fn write_to_server(
        &mut self,
        operation: BulkOperation,
        table: &DataTable,
        options: &BulkCopyOptions,
    ) -> Result<u64> {
        (**self).write_to_server(operation, table, options)
    }
}
