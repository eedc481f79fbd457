//! Scoped suspension of automatic change detection.

use crate::PersistenceContext;
use std::ops::{Deref, DerefMut};

/// Turns a context's automatic change detection off for as long as the
/// guard lives.
///
/// On drop, detection is switched back **on**, whether the scope ended
/// normally, through `?`, or by unwinding. The value it had on entry is
/// not restored; it is only kept for diagnostics.
///
/// The guard dereferences to the context, so the guarded scope works
/// through it:
///
/// ```ignore
/// let mut guard = AutoDetectChangesGuard::new(&mut session);
/// for entity in &entities {
///     guard.set_entity_state(entity, EntityState::Unchanged)?;
/// }
/// // dropped here: auto-detect is enabled again
/// ```
pub struct AutoDetectChangesGuard<'a, P: PersistenceContext> {
    ctx: &'a mut P,
    previous: bool,
}

impl<'a, P: PersistenceContext> AutoDetectChangesGuard<'a, P> {
    /// Disable automatic change detection on `ctx`.
    pub fn new(ctx: &'a mut P) -> Self {
        let previous = ctx.auto_detect_changes();
        ctx.set_auto_detect_changes(false);
        tracing::trace!(previous, "Auto-detect changes suspended");
        Self { ctx, previous }
    }

    /// Whether detection was enabled when the guard was created.
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl<P: PersistenceContext> Deref for AutoDetectChangesGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.ctx
    }
}

impl<P: PersistenceContext> DerefMut for AutoDetectChangesGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.ctx
    }
}

impl<P: PersistenceContext> Drop for AutoDetectChangesGuard<'_, P> {
    fn drop(&mut self) {
        self.ctx.set_auto_detect_changes(true);
        if !self.previous {
            tracing::debug!("Auto-detect changes was disabled before the guard; re-enabled on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockConnection, Person};
    use crate::{EntityState, Session, SessionConfig};
    use bulkmodel_core::{Error, Result, TrackingErrorKind};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn session() -> Session<MockConnection> {
        Session::new(MockConnection::new(false))
    }

    #[test]
    fn test_guard_disables_then_enables() {
        let mut session = session();
        {
            let guard = AutoDetectChangesGuard::new(&mut session);
            assert!(!guard.auto_detect_changes());
            assert!(guard.previous());
        }
        assert!(session.auto_detect_changes());
    }

    #[test]
    fn test_guard_enables_even_if_previously_disabled() {
        let mut session = Session::with_config(
            MockConnection::new(false),
            SessionConfig::new().auto_detect_changes(false),
        );
        {
            let guard = AutoDetectChangesGuard::new(&mut session);
            assert!(!guard.previous());
        }
        assert!(session.auto_detect_changes());
    }

    #[test]
    fn test_guarded_work_does_not_scan() {
        let mut session = session();
        session.attach(&Person::new(1, "A")).unwrap();
        {
            let mut guard = AutoDetectChangesGuard::new(&mut session);
            guard
                .set_entity_state(&Person::new(1, "A"), EntityState::Unchanged)
                .unwrap();
            assert_eq!(
                guard.entity_state(&Person::new(1, "A")).unwrap(),
                EntityState::Unchanged
            );
        }
        assert_eq!(session.stats().change_scans, 0);
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn failing(session: &mut Session<MockConnection>) -> Result<()> {
            let mut guard = AutoDetectChangesGuard::new(session);
            guard.detach(&Person::new(42, "nobody"))?;
            Ok(())
        }

        let mut session = session();
        let err = failing(&mut session).unwrap_err();
        assert!(matches!(err, Error::Tracking(ref e) if e.kind == TrackingErrorKind::NotTracked));
        assert!(session.auto_detect_changes());
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let mut session = session();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let guard = AutoDetectChangesGuard::new(&mut session);
            assert!(!guard.auto_detect_changes());
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(session.auto_detect_changes());
    }
}
