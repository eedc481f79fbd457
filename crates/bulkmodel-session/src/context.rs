//! The persistence-context interface bulk operations reconcile against.

use crate::EntityState;
use bulkmodel_core::{Connection, Model, Result};

/// An entity-tracking context with an optional automatic change detector.
///
/// Entities are identified by type and primary key. When automatic change
/// detection is enabled, state queries and state assignments may first
/// scan every tracked entity for modifications; bulk reconciliation turns
/// it off for the duration of its loop (see
/// [`AutoDetectChangesGuard`](crate::AutoDetectChangesGuard)).
pub trait PersistenceContext {
    /// Driver connection type.
    type Conn: Connection;

    /// The connection used to query and begin transactions.
    fn connection(&self) -> &Self::Conn;

    /// Is automatic change detection enabled?
    fn auto_detect_changes(&self) -> bool;

    /// Enable or disable automatic change detection.
    fn set_auto_detect_changes(&mut self, enabled: bool);

    /// Is this entity tracked?
    ///
    /// An entity that cannot be identified (null primary key) is never
    /// tracked.
    #[allow(clippy::result_large_err)]
    fn contains<M: Model>(&self, entity: &M) -> Result<bool>;

    /// Tracking state of an entity; [`EntityState::Detached`] if untracked.
    #[allow(clippy::result_large_err)]
    fn entity_state<M: Model>(&mut self, entity: &M) -> Result<EntityState>;

    /// Assign a tracking state, attaching the entity if it is untracked.
    ///
    /// Assigning [`EntityState::Unchanged`] makes the entity's current
    /// values the new baseline for change detection.
    #[allow(clippy::result_large_err)]
    fn set_entity_state<M: Model>(&mut self, entity: &M, state: EntityState) -> Result<()>;

    /// Remove an entity from the tracking set entirely.
    ///
    /// This is the lower-level removal: no change detection runs and no
    /// state transition is recorded. Detaching an untracked entity is a
    /// [`TrackingErrorKind::NotTracked`](bulkmodel_core::TrackingErrorKind)
    /// error.
    #[allow(clippy::result_large_err)]
    fn detach<M: Model>(&mut self, entity: &M) -> Result<()>;
}
