//! Database connection traits.
//!
//! This module defines the two driver abstractions bulk operations need:
//!
//! - [`Connection`] - Reports whether a transaction is active and begins one
//! - [`TransactionOps`] - Commits or rolls back a transaction begun by us
//!
//! Everything else a driver does (queries, prepared statements, pooling) is
//! out of scope here; the bulk-copy stream itself goes through the
//! `BulkCopy` transport in `bulkmodel-copy`.

use crate::error::Result;

/// A database connection as seen by the bulk helpers.
///
/// `begin` takes `&self` and returns an owned transaction handle, so a
/// caller can hold the handle while still mutating the persistence context
/// that owns the connection.
pub trait Connection {
    /// Transaction type returned by [`Connection::begin`].
    type Tx: TransactionOps;

    /// Is a transaction currently active on this connection?
    fn in_transaction(&self) -> bool;

    /// Begin a new transaction with the driver's default isolation level.
    #[allow(clippy::result_large_err)]
    fn begin(&self) -> Result<Self::Tx>;
}

/// Trait for transaction operations.
///
/// Transactions must be explicitly committed or rolled back. Both consume
/// the handle, so a finished transaction cannot be finished again.
pub trait TransactionOps {
    /// Commit the transaction, making all changes permanent.
    #[allow(clippy::result_large_err)]
    fn commit(self) -> Result<()>;

    /// Rollback the transaction, discarding all changes.
    #[allow(clippy::result_large_err)]
    fn rollback(self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        begun: Cell<u32>,
        committed: Cell<u32>,
    }

    struct MockConnection {
        active: bool,
        log: Rc<Log>,
    }

    struct MockTx {
        log: Rc<Log>,
    }

    impl Connection for MockConnection {
        type Tx = MockTx;

        fn in_transaction(&self) -> bool {
            self.active
        }

        fn begin(&self) -> Result<MockTx> {
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
            Ok(())
        }
    }

    #[test]
    fn test_begin_returns_owned_handle() {
        let log = Rc::new(Log::default());
        let conn = MockConnection {
            active: false,
            log: Rc::clone(&log),
        };
        assert!(!conn.in_transaction());

        let tx = conn.begin().unwrap();
        tx.commit().unwrap();
        assert_eq!(log.begun.get(), 1);
        assert_eq!(log.committed.get(), 1);
    }
}
