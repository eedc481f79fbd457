//! Join-or-begin transaction scoping for bulk operations.

use crate::PersistenceContext;
use bulkmodel_core::{Connection, Result, TransactionOps};

/// The transaction a bulk operation runs in.
///
/// [`TransactionScope::Owned`] wraps a transaction this operation began and
/// must finish. [`TransactionScope::Joined`] means an outer transaction was
/// already active; the scope then commits and rolls back nothing, leaving
/// the outcome to whoever began it.
#[must_use = "an owned transaction must be completed or aborted"]
#[derive(Debug)]
pub enum TransactionScope<T> {
    /// A transaction begun for this operation.
    Owned(T),
    /// An already-active transaction was joined.
    Joined,
}

impl<T: TransactionOps> TransactionScope<T> {
    /// Did this scope begin its own transaction?
    pub fn is_owned(&self) -> bool {
        matches!(self, TransactionScope::Owned(_))
    }

    /// Commit if owned; no-op if joined.
    #[allow(clippy::result_large_err)]
    pub fn complete(self) -> Result<()> {
        match self {
            TransactionScope::Owned(tx) => {
                tracing::debug!("Committing owned bulk transaction");
                tx.commit()
            }
            TransactionScope::Joined => Ok(()),
        }
    }

    /// Roll back if owned; no-op if joined.
    #[allow(clippy::result_large_err)]
    pub fn abort(self) -> Result<()> {
        match self {
            TransactionScope::Owned(tx) => {
                tracing::debug!("Rolling back owned bulk transaction");
                tx.rollback()
            }
            TransactionScope::Joined => Ok(()),
        }
    }
}

/// Join the context's active transaction, or begin a new one.
///
/// Begins exactly one transaction when none is active and none when one is.
/// A driver failure to begin is returned unchanged.
#[allow(clippy::result_large_err)]
#[tracing::instrument(level = "debug", skip(ctx))]
pub fn ensure_transaction<P: PersistenceContext>(
    ctx: &P,
) -> Result<TransactionScope<<P::Conn as Connection>::Tx>> {
    let conn = ctx.connection();
    if conn.in_transaction() {
        tracing::debug!("Joining active transaction");
        return Ok(TransactionScope::Joined);
    }
    let tx = conn.begin()?;
    tracing::debug!("Began owned transaction");
    Ok(TransactionScope::Owned(tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Session;
    use crate::test_support::MockConnection;
    use bulkmodel_core::{Error, TransactionErrorKind};

    #[test]
    fn test_begins_when_no_transaction_active() {
        let session = Session::new(MockConnection::new(false));
        let scope = ensure_transaction(&session).unwrap();
        assert!(scope.is_owned());
        scope.complete().unwrap();

        let log = &session.connection().log;
        assert_eq!(log.begun.get(), 1);
        assert_eq!(log.committed.get(), 1);
    }

    #[test]
    fn test_joins_active_transaction() {
        let session = Session::new(MockConnection::new(true));
        let scope = ensure_transaction(&session).unwrap();
        assert!(!scope.is_owned());
        scope.complete().unwrap();

        let log = &session.connection().log;
        assert_eq!(log.begun.get(), 0);
        assert_eq!(log.committed.get(), 0);
    }

    #[test]
    fn test_abort_rolls_back_only_owned() {
        let session = Session::new(MockConnection::new(false));
        ensure_transaction(&session).unwrap().abort().unwrap();
        assert_eq!(session.connection().log.rolled_back.get(), 1);

        let joined = Session::new(MockConnection::new(true));
        ensure_transaction(&joined).unwrap().abort().unwrap();
        assert_eq!(joined.connection().log.rolled_back.get(), 0);
    }

    #[test]
    fn test_begin_failure_propagates() {
        let mut conn = MockConnection::new(false);
        conn.fail_begin = true;
        let session = Session::new(conn);

        match ensure_transaction(&session) {
            Err(Error::Transaction(e)) => assert_eq!(e.kind, TransactionErrorKind::BeginFailed),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected begin failure"),
        }
    }
}
