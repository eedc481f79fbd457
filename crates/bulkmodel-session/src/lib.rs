//! Entity tracking and post-bulk reconciliation for BulkModel Rust.
//!
//! `bulkmodel-session` is the **tracking layer** around bulk operations. A
//! bulk copy writes rows behind the persistence context's back, so the
//! context has to be told what happened afterwards, cheaply and without
//! tripping its automatic change detector.
//!
//! # Role In The Architecture
//!
//! - **Persistence context**: [`PersistenceContext`] is the interface bulk
//!   helpers reconcile against; [`Session`] is the in-process implementation
//!   (identity-keyed tracking set plus snapshot change detection).
//! - **Transaction scoping**: [`ensure_transaction`] joins an active
//!   transaction or begins one the caller then owns.
//! - **Reconciliation**: [`mark_unchanged`] and [`detach`] run under an
//!   [`AutoDetectChangesGuard`].
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::new(conn);
//! session.attach(&person)?;
//!
//! let scope = ensure_transaction(&session)?;
//! // ... stream rows through a bulk-copy transport ...
//! mark_unchanged(&mut session, &people)?;
//! scope.complete()?;
//! ```

pub mod auto_detect;
pub mod change_tracker;
pub mod context;
pub mod reconcile;
pub mod transaction;

pub use auto_detect::AutoDetectChangesGuard;
pub use change_tracker::{ChangeTracker, ObjectSnapshot};
pub use context::PersistenceContext;
pub use reconcile::{detach, mark_unchanged};
pub use transaction::{TransactionScope, ensure_transaction};

use bulkmodel_core::{
    Connection, Error, Model, Result, TrackingError, TrackingErrorKind, Value,
};
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

// ============================================================================
// Session Configuration
// ============================================================================

/// Configuration for Session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial value of the automatic change detection switch.
    pub auto_detect_changes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_detect_changes: true,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial auto-detect switch (builder pattern).
    #[must_use]
    pub fn auto_detect_changes(mut self, enabled: bool) -> Self {
        self.auto_detect_changes = enabled;
        self
    }
}

// ============================================================================
// Object Key and State
// ============================================================================

/// Identity of a tracked entity: its type plus a hash of its primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Type identifier for the Model type.
    type_id: TypeId,
    /// Hash of the primary key value(s).
    pk_hash: u64,
}

impl ObjectKey {
    /// Create an object key from a model instance.
    ///
    /// Fails with [`TrackingErrorKind::MissingKey`] when the model has no
    /// primary key or any key value is NULL.
    #[allow(clippy::result_large_err)]
    pub fn from_model<M: Model>(obj: &M) -> Result<Self> {
        let pk_values = obj.primary_key_value()?;
        if pk_values.is_empty() || pk_values.iter().any(Value::is_null) {
            return Err(Error::Tracking(TrackingError {
                kind: TrackingErrorKind::MissingKey,
                entity: std::any::type_name::<M>(),
                message: "entity has no primary key value to identify it".to_string(),
            }));
        }
        Ok(Self::from_pk::<M>(&pk_values))
    }

    /// Create an object key from type and primary key.
    pub fn from_pk<M: 'static>(pk: &[Value]) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            pk_hash: hash_values(pk),
        }
    }

    /// Get the primary key hash.
    pub fn pk_hash(&self) -> u64 {
        self.pk_hash
    }

    /// Get the type identifier.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// Hash a slice of values for use as a primary key hash.
fn hash_values(values: &[Value]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    for v in values {
        hash_value(v, &mut hasher);
    }
    hasher.finish()
}

/// Hash a single value into the hasher, tagged by variant.
fn hash_value(v: &Value, hasher: &mut impl Hasher) {
    match v {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        // Integer widths share a tag so `Int(1)` and `BigInt(1)` identify
        // the same row.
        Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
            2u8.hash(hasher);
            v.as_i64().hash(hasher);
        }
        Value::Float(f) => {
            6u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Double(f) => {
            7u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Decimal(s) => {
            8u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Text(s) => {
            9u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Bytes(b) => {
            10u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Date(d) => {
            11u8.hash(hasher);
            d.hash(hasher);
        }
        Value::Time(t) => {
            12u8.hash(hasher);
            t.hash(hasher);
        }
        Value::Timestamp(ts) => {
            13u8.hash(hasher);
            ts.hash(hasher);
        }
        Value::TimestampTz(ts) => {
            14u8.hash(hasher);
            ts.hash(hasher);
        }
        Value::Uuid(u) => {
            15u8.hash(hasher);
            u.hash(hasher);
        }
        Value::Json(j) => {
            16u8.hash(hasher);
            j.to_string().hash(hasher);
        }
        Value::Array(arr) => {
            17u8.hash(hasher);
            arr.len().hash(hasher);
            for item in arr {
                hash_value(item, hasher);
            }
        }
        Value::Default => 18u8.hash(hasher),
    }
}

/// Tracking state of an entity in a persistence context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityState {
    /// New entity, not yet in the database.
    Added,
    /// Tracked and matching its baseline.
    Unchanged,
    /// Tracked and changed since its baseline.
    Modified,
    /// Tracked and scheduled for deletion.
    Deleted,
    /// Not tracked.
    Detached,
}

/// Number of tracked entities per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub added: usize,
    pub unchanged: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl StateCounts {
    /// Total number of tracked entities.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.unchanged + self.modified + self.deleted
    }
}

/// Counters describing change-detection work done by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Full change-detection scans run.
    pub change_scans: u64,
    /// Tracked entries visited across all scans.
    pub entries_scanned: u64,
}

/// A tracked entity in the session.
struct TrackedEntity {
    /// Entity type name, for diagnostics.
    model: &'static str,
    /// Current state.
    state: EntityState,
    /// Column names, positionally matching `values`.
    columns: Vec<&'static str>,
    /// Most recently recorded values.
    values: Vec<Value>,
}

// ============================================================================
// Session
// ============================================================================

/// An in-process persistence context.
///
/// The session does not own entities. It records each tracked entity's
/// column values when the entity is added, attached, updated or given a
/// state, and detects changes by comparing recorded values against the
/// baseline snapshot.
pub struct Session<C: Connection> {
    /// The database connection.
    connection: C,
    /// Configuration.
    config: SessionConfig,
    /// Current auto-detect switch.
    auto_detect_changes: bool,
    /// Tracking set: ObjectKey -> TrackedEntity.
    entries: HashMap<ObjectKey, TrackedEntity>,
    /// Baselines for change detection.
    tracker: ChangeTracker,
    stats: SessionStats,
}

impl<C: Connection> Session<C> {
    /// Create a session with default configuration.
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, SessionConfig::default())
    }

    /// Create a session with custom configuration.
    pub fn with_config(connection: C, config: SessionConfig) -> Self {
        Self {
            connection,
            auto_detect_changes: config.auto_detect_changes,
            config,
            entries: HashMap::new(),
            tracker: ChangeTracker::new(),
            stats: SessionStats::default(),
        }
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access to the connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Consume the session and return its connection.
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Track a new entity as [`EntityState::Added`].
    ///
    /// Adding an entity that is already tracked is an
    /// [`TrackingErrorKind::InvalidState`] error; use
    /// [`PersistenceContext::set_entity_state`] to move a tracked entity to
    /// `Added`.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, entity), fields(model = std::any::type_name::<M>()))]
    pub fn add<M: Model>(&mut self, entity: &M) -> Result<()> {
        let key = ObjectKey::from_model(entity)?;
        if self.entries.contains_key(&key) {
            return Err(tracking_error::<M>(
                TrackingErrorKind::InvalidState,
                "entity is already tracked",
            ));
        }
        self.track(key, entity, EntityState::Added)
    }

    /// Track an entity that already exists in the database as
    /// [`EntityState::Unchanged`].
    ///
    /// Attaching an entity that is already tracked is an
    /// [`TrackingErrorKind::InvalidState`] error.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, entity), fields(model = std::any::type_name::<M>()))]
    pub fn attach<M: Model>(&mut self, entity: &M) -> Result<()> {
        let key = ObjectKey::from_model(entity)?;
        if self.entries.contains_key(&key) {
            return Err(tracking_error::<M>(
                TrackingErrorKind::InvalidState,
                "entity is already tracked",
            ));
        }
        self.track(key, entity, EntityState::Unchanged)
    }

    /// Record the current values of a tracked entity.
    ///
    /// The state is left alone; the next change-detection scan compares the
    /// recorded values against the baseline.
    #[allow(clippy::result_large_err)]
    pub fn update<M: Model>(&mut self, entity: &M) -> Result<()> {
        let key = ObjectKey::from_model(entity)?;
        let (_, values) = capture(entity)?;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| not_tracked::<M>())?;
        entry.values = values;
        Ok(())
    }

    /// Schedule a tracked entity for deletion.
    ///
    /// An [`EntityState::Added`] entity was never persisted and is simply
    /// dropped from the tracking set.
    #[allow(clippy::result_large_err)]
    pub fn remove<M: Model>(&mut self, entity: &M) -> Result<()> {
        let key = ObjectKey::from_model(entity)?;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| not_tracked::<M>())?;
        if entry.state == EntityState::Added {
            self.entries.remove(&key);
            self.tracker.clear(&key);
        } else {
            entry.state = EntityState::Deleted;
        }
        Ok(())
    }

    /// Scan every tracked entity and mark changed ones as
    /// [`EntityState::Modified`].
    ///
    /// Returns how many entities were newly marked. Cost is linear in the
    /// number of tracked entities.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self), fields(tracked = self.entries.len()))]
    pub fn detect_changes(&mut self) -> Result<usize> {
        let mut modified = 0;
        for (key, entry) in &mut self.entries {
            if entry.state == EntityState::Unchanged && self.tracker.is_dirty(key, &entry.values)? {
                tracing::trace!(model = entry.model, pk_hash = key.pk_hash(), "Entity modified");
                entry.state = EntityState::Modified;
                modified += 1;
            }
        }
        self.stats.change_scans += 1;
        self.stats.entries_scanned += self.entries.len() as u64;
        tracing::debug!(modified, "Change detection scan complete");
        Ok(modified)
    }

    /// State of an entity without running change detection.
    ///
    /// `None` when the entity is not tracked.
    #[allow(clippy::result_large_err)]
    pub fn tracked_state<M: Model>(&self, entity: &M) -> Result<Option<EntityState>> {
        let key = ObjectKey::from_model(entity)?;
        Ok(self.entries.get(&key).map(|e| e.state))
    }

    /// Columns of a tracked entity whose recorded value differs from its
    /// baseline.
    #[allow(clippy::result_large_err)]
    pub fn changed_columns<M: Model>(&self, entity: &M) -> Result<Vec<&'static str>> {
        let key = ObjectKey::from_model(entity)?;
        let entry = self.entries.get(&key).ok_or_else(|| not_tracked::<M>())?;
        self.tracker
            .changed_columns(&key, &entry.columns, &entry.values)
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stop tracking everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tracker.clear_all();
    }

    /// Count tracked entities by state.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for entry in self.entries.values() {
            match entry.state {
                EntityState::Added => counts.added += 1,
                EntityState::Unchanged => counts.unchanged += 1,
                EntityState::Modified => counts.modified += 1,
                EntityState::Deleted => counts.deleted += 1,
                EntityState::Detached => {}
            }
        }
        counts
    }

    /// Change-detection counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Reset change-detection counters.
    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// Insert or overwrite an entry in `state`, baselining tracked states.
    #[allow(clippy::result_large_err)]
    fn track<M: Model>(&mut self, key: ObjectKey, entity: &M, state: EntityState) -> Result<()> {
        let (columns, values) = capture(entity)?;
        if state == EntityState::Added {
            self.tracker.clear(&key);
        } else if state == EntityState::Unchanged || !self.tracker.has_snapshot(&key) {
            self.tracker.snapshot(key, &values)?;
        }
        self.entries.insert(
            key,
            TrackedEntity {
                model: std::any::type_name::<M>(),
                state,
                columns,
                values,
            },
        );
        Ok(())
    }
}

impl<C: Connection> PersistenceContext for Session<C> {
    type Conn = C;

    fn connection(&self) -> &C {
        &self.connection
    }

    fn auto_detect_changes(&self) -> bool {
        self.auto_detect_changes
    }

    fn set_auto_detect_changes(&mut self, enabled: bool) {
        self.auto_detect_changes = enabled;
    }

    fn contains<M: Model>(&self, entity: &M) -> Result<bool> {
        match ObjectKey::from_model(entity) {
            Ok(key) => Ok(self.entries.contains_key(&key)),
            Err(e) if e.tracking_kind() == Some(TrackingErrorKind::MissingKey) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn entity_state<M: Model>(&mut self, entity: &M) -> Result<EntityState> {
        if self.auto_detect_changes {
            self.detect_changes()?;
        }
        match ObjectKey::from_model(entity) {
            Ok(key) => Ok(self
                .entries
                .get(&key)
                .map_or(EntityState::Detached, |e| e.state)),
            Err(e) if e.tracking_kind() == Some(TrackingErrorKind::MissingKey) => {
                Ok(EntityState::Detached)
            }
            Err(e) => Err(e),
        }
    }

    fn set_entity_state<M: Model>(&mut self, entity: &M, state: EntityState) -> Result<()> {
        if self.auto_detect_changes {
            self.detect_changes()?;
        }
        let key = ObjectKey::from_model(entity)?;
        if state == EntityState::Detached {
            self.entries.remove(&key);
            self.tracker.clear(&key);
            return Ok(());
        }
        tracing::trace!(
            model = std::any::type_name::<M>(),
            pk_hash = key.pk_hash(),
            state = ?state,
            "Setting entity state"
        );
        self.track(key, entity, state)
    }

    fn detach<M: Model>(&mut self, entity: &M) -> Result<()> {
        let key = ObjectKey::from_model(entity)?;
        if self.entries.remove(&key).is_none() {
            return Err(not_tracked::<M>());
        }
        self.tracker.clear(&key);
        tracing::trace!(
            model = std::any::type_name::<M>(),
            pk_hash = key.pk_hash(),
            "Detached entity"
        );
        Ok(())
    }
}

/// Read an entity's column names and values.
#[allow(clippy::result_large_err)]
fn capture<M: Model>(entity: &M) -> Result<(Vec<&'static str>, Vec<Value>)> {
    Ok(entity.to_row()?.into_iter().unzip())
}

fn tracking_error<M: Model>(kind: TrackingErrorKind, message: &str) -> Error {
    Error::Tracking(TrackingError {
        kind,
        entity: std::any::type_name::<M>(),
        message: message.to_string(),
    })
}

fn not_tracked<M: Model>() -> Error {
    tracking_error::<M>(TrackingErrorKind::NotTracked, "entity is not tracked")
}

#[cfg(test)]
pub(crate) mod test_support;
