//! A running process instance.

use nebula_core::{CheckpointId, Metadata, ProcessId, Timestamp};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Recovery bookkeeping stamped on an instance after a restore:
/// `recovery: {checkpointId, lastSavedAt}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryInfo {
    /// The checkpoint the instance was restored from.
    pub checkpoint_id: CheckpointId,
    /// The checkpoint's own creation time (when its snapshot was taken).
    pub last_saved_at: Timestamp,
}

/// A live finite-state-machine instance.
///
/// Invariant: `state` is always one of `definition.states` (enforced by
/// [`crate::ProcessManager`], which only ever assigns `state` from a
/// validated transition or a checkpoint taken from a prior valid state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInstance<S, D> {
    /// Unique instance id.
    pub id: ProcessId,
    /// The process type this is an instance of.
    pub process_type: String,
    /// The definition version this instance was created against.
    pub version: Version,
    /// Current FSM state.
    pub state: S,
    /// Application data carried alongside the state.
    pub data: D,
    /// When the instance was created.
    pub created_at: Timestamp,
    /// When the instance was last updated.
    pub updated_at: Timestamp,
    /// Free-form metadata, including `lastTransition`, `restoredFrom`,
    /// `latestCheckpoint`.
    pub metadata: Metadata,
    /// Set once the instance has been restored from a checkpoint.
    pub recovery: Option<RecoveryInfo>,
}

impl<S, D> ProcessInstance<S, D> {
    /// Construct a fresh instance in `state` with the given `data`.
    #[must_use]
    pub fn new(process_type: impl Into<String>, version: Version, state: S, data: D) -> Self {
        let now = Timestamp::now();
        Self {
            id: ProcessId::v4(),
            process_type: process_type.into(),
            version,
            state,
            data,
            created_at: now,
            updated_at: now,
            metadata: Metadata::new(),
            recovery: None,
        }
    }

    /// Record a transition in `metadata.lastTransition`.
    pub(crate) fn stamp_last_transition(&mut self, from: &S, to: &S, event: &str)
    where
        S: std::fmt::Debug,
    {
        self.metadata.insert(
            "lastTransition",
            json!({
                "from": format!("{from:?}"),
                "to": format!("{to:?}"),
                "event": event,
                "timestamp": Timestamp::now().as_millis(),
            }),
        );
    }

    /// Record a checkpoint id in `metadata.latestCheckpoint`.
    pub(crate) fn stamp_latest_checkpoint(&mut self, checkpoint_id: CheckpointId) {
        self.metadata
            .insert("latestCheckpoint", checkpoint_id.to_string());
    }

    /// Record a restore in `metadata.restoredFrom`/`restoredAt`.
    pub(crate) fn stamp_restored(&mut self, checkpoint_id: CheckpointId) {
        self.metadata
            .insert("restoredFrom", checkpoint_id.to_string());
        self.metadata
            .insert("restoredAt", Timestamp::now().as_millis());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_stamps_created_and_updated() {
        let instance: ProcessInstance<&str, i32> =
            ProcessInstance::new("order", Version::new(1, 0, 0), "created", 0);
        assert_eq!(instance.created_at, instance.updated_at);
        assert!(instance.recovery.is_none());
        assert!(instance.metadata.is_empty());
    }

    #[test]
    fn stamp_last_transition_records_fields() {
        let mut instance: ProcessInstance<&str, i32> =
            ProcessInstance::new("order", Version::new(1, 0, 0), "created", 0);
        instance.stamp_last_transition(&"created", &"approved", "approve");
        let value = instance.metadata.get("lastTransition").unwrap();
        assert_eq!(value["event"], json!("approve"));
    }
}
