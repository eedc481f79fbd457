//! Change tracking and dirty detection for the BulkModel session.
//!
//! This module provides snapshot-based change tracking to detect when a
//! tracked entity's recorded values have moved away from the baseline taken
//! when it was attached or last marked unchanged.

use crate::ObjectKey;
use bulkmodel_core::{Result, Value};
use std::collections::HashMap;
use std::time::Instant;

/// Snapshot of an entity's column values at a point in time.
#[derive(Debug)]
pub struct ObjectSnapshot {
    /// Values as recorded.
    values: Vec<Value>,
    /// Serialized values (JSON bytes).
    data: Vec<u8>,
    /// Timestamp when snapshot was taken.
    taken_at: Instant,
}

impl ObjectSnapshot {
    /// Create a new snapshot of `values`.
    #[allow(clippy::result_large_err)]
    pub fn new(values: &[Value]) -> Result<Self> {
        Ok(Self {
            data: serde_json::to_vec(values)?,
            values: values.to_vec(),
            taken_at: Instant::now(),
        })
    }

    /// Get the recorded values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get the snapshot data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the timestamp when the snapshot was taken.
    pub fn taken_at(&self) -> Instant {
        self.taken_at
    }
}

/// Tracks changes to entities in the session.
///
/// Uses snapshot comparison to detect when values have been modified.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    /// Original snapshots by object key.
    snapshots: HashMap<ObjectKey, ObjectSnapshot>,
}

impl ChangeTracker {
    /// Create a new empty change tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot of an entity's values, replacing any previous one.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "trace", skip(self, values))]
    pub fn snapshot(&mut self, key: ObjectKey, values: &[Value]) -> Result<()> {
        let snapshot = ObjectSnapshot::new(values)?;
        tracing::trace!(
            pk_hash = key.pk_hash(),
            snapshot_bytes = snapshot.data.len(),
            "Taking object snapshot"
        );
        self.snapshots.insert(key, snapshot);
        Ok(())
    }

    /// Check if values differ from the snapshot.
    ///
    /// Values without a snapshot are treated as dirty.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "trace", skip(self, values))]
    pub fn is_dirty(&self, key: &ObjectKey, values: &[Value]) -> Result<bool> {
        let Some(snapshot) = self.snapshots.get(key) else {
            tracing::trace!(
                pk_hash = key.pk_hash(),
                dirty = true,
                "No snapshot - treating as dirty"
            );
            return Ok(true);
        };

        let current = serde_json::to_vec(values)?;
        let dirty = current != snapshot.data;
        tracing::trace!(pk_hash = key.pk_hash(), dirty = dirty, "Dirty check result");
        Ok(dirty)
    }

    /// Names of the columns whose value differs from the snapshot.
    ///
    /// `columns` names `values` positionally. Values are compared in their
    /// serialized form, the same as [`ChangeTracker::is_dirty`], so a NaN
    /// that is unchanged is not reported. Without a snapshot every column is
    /// reported.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, columns, values))]
    pub fn changed_columns(
        &self,
        key: &ObjectKey,
        columns: &[&'static str],
        values: &[Value],
    ) -> Result<Vec<&'static str>> {
        let Some(snapshot) = self.snapshots.get(key) else {
            return Ok(columns.to_vec());
        };

        let mut changed = Vec::new();
        for (i, name) in columns.iter().enumerate() {
            let before = snapshot.values.get(i).map(serde_json::to_vec).transpose()?;
            let after = values.get(i).map(serde_json::to_vec).transpose()?;
            if before != after {
                changed.push(*name);
            }
        }

        tracing::debug!(
            changed_count = changed.len(),
            fields = ?changed,
            "Detected changed columns"
        );
        Ok(changed)
    }

    /// Check if a snapshot exists for the given key.
    pub fn has_snapshot(&self, key: &ObjectKey) -> bool {
        self.snapshots.contains_key(key)
    }

    /// Get the snapshot for a key.
    pub fn get_snapshot(&self, key: &ObjectKey) -> Option<&ObjectSnapshot> {
        self.snapshots.get(key)
    }

    /// Clear snapshot for a specific entity.
    pub fn clear(&mut self, key: &ObjectKey) {
        self.snapshots.remove(key);
    }

    /// Clear all snapshots.
    pub fn clear_all(&mut self) {
        self.snapshots.clear();
    }

    /// Number of tracked snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if there are no snapshots.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hero;

    fn key(id: i64) -> ObjectKey {
        ObjectKey::from_pk::<Hero>(&[Value::BigInt(id)])
    }

    fn values(name: &str, age: Option<i32>) -> Vec<Value> {
        vec![Value::BigInt(1), Value::Text(name.to_string()), age.into()]
    }

    const COLUMNS: &[&str] = &["id", "name", "age"];

    #[test]
    fn test_is_dirty_false_if_unchanged() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(key(1), &values("Ada", Some(36))).unwrap();
        assert!(!tracker.is_dirty(&key(1), &values("Ada", Some(36))).unwrap());
    }

    #[test]
    fn test_is_dirty_true_if_field_changed() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(key(1), &values("Ada", Some(36))).unwrap();
        assert!(tracker.is_dirty(&key(1), &values("Ada", None)).unwrap());
    }

    #[test]
    fn test_is_dirty_true_if_no_snapshot() {
        let tracker = ChangeTracker::new();
        assert!(tracker.is_dirty(&key(1), &values("Ada", None)).unwrap());
    }

    #[test]
    fn test_snapshot_overwrites_previous() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(key(1), &values("Ada", None)).unwrap();
        tracker.snapshot(key(1), &values("Grace", None)).unwrap();
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_dirty(&key(1), &values("Grace", None)).unwrap());
    }

    #[test]
    fn test_changed_columns_lists_modified() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(key(1), &values("Ada", Some(36))).unwrap();
        let changed = tracker
            .changed_columns(&key(1), COLUMNS, &values("Grace", None))
            .unwrap();
        assert_eq!(changed, vec!["name", "age"]);
    }

    #[test]
    fn test_changed_columns_without_snapshot_is_all() {
        let tracker = ChangeTracker::new();
        let changed = tracker
            .changed_columns(&key(1), COLUMNS, &values("Ada", None))
            .unwrap();
        assert_eq!(changed, COLUMNS.to_vec());
    }

    #[test]
    fn test_non_finite_floats_compare_without_error() {
        let mut tracker = ChangeTracker::new();
        let before = vec![Value::BigInt(1), Value::Double(f64::NAN), Value::Float(1.5)];
        tracker.snapshot(key(1), &before).unwrap();

        let same = tracker
            .changed_columns(&key(1), &["id", "ratio", "weight"], &before)
            .unwrap();
        assert!(same.is_empty());
        assert!(!tracker.is_dirty(&key(1), &before).unwrap());

        let after = vec![Value::BigInt(1), Value::Double(0.5), Value::Float(f32::INFINITY)];
        let changed = tracker
            .changed_columns(&key(1), &["id", "ratio", "weight"], &after)
            .unwrap();
        assert_eq!(changed, vec!["ratio", "weight"]);
        assert_eq!(tracker.get_snapshot(&key(1)).unwrap().values().len(), 3);
    }

    #[test]
    fn test_clear_and_clear_all() {
        let mut tracker = ChangeTracker::new();
        tracker.snapshot(key(1), &values("Ada", None)).unwrap();
        tracker.snapshot(key(2), &values("Grace", None)).unwrap();

        tracker.clear(&key(1));
        assert!(!tracker.has_snapshot(&key(1)));
        assert!(tracker.get_snapshot(&key(2)).is_some());

        tracker.clear_all();
        assert!(tracker.is_empty());
    }
}
