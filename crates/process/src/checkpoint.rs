//! Immutable process checkpoints.

use nebula_core::{CheckpointId, ProcessId, Timestamp};
use semver::Version;
use serde::{Deserialize, Serialize};

/// Checkpoint-scoped metadata: `metadata: {version, processType}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// The definition version the snapshotted instance was running.
    pub version: Version,
    /// The process type the snapshotted instance belongs to.
    pub process_type: String,
}

/// An immutable deep snapshot of a [`crate::ProcessInstance`]'s state and
/// data.
///
/// Invariant: immutable after creation; references its surviving process
/// definition by `type + version`, not by a live pointer to the definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessCheckpoint<S, D> {
    /// Unique checkpoint id.
    pub id: CheckpointId,
    /// The instance this checkpoint was taken from.
    pub process_id: ProcessId,
    /// The instance's state at snapshot time.
    pub state: S,
    /// The instance's data at snapshot time (deep clone).
    pub data: D,
    /// When the snapshot was taken.
    pub created_at: Timestamp,
    /// Definition identity the snapshot was taken against.
    pub metadata: CheckpointMetadata,
}

impl<S, D> ProcessCheckpoint<S, D> {
    /// Construct a checkpoint snapshotting `state`/`data` for `process_id`.
    #[must_use]
    pub fn new(
        process_id: ProcessId,
        state: S,
        data: D,
        process_type: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            id: CheckpointId::v4(),
            process_id,
            state,
            data,
            created_at: Timestamp::now(),
            metadata: CheckpointMetadata {
                version,
                process_type: process_type.into(),
            },
        }
    }
}

impl<S, D> ProcessCheckpoint<S, D>
where
    S: Serialize,
    D: Serialize,
{
    /// Render this checkpoint as a JSON value, for inspection or a
    /// persistence adapter. Persistence adapters must preserve checkpoint
    /// immutability.
    ///
    /// # Errors
    ///
    /// Returns an error if `S` or `D` fail to serialize.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl<S, D> ProcessCheckpoint<S, D>
where
    S: serde::de::DeserializeOwned,
    D: serde::de::DeserializeOwned,
{
    /// Rehydrate a checkpoint from a JSON value produced by [`Self::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not match the checkpoint's shape.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let checkpoint: ProcessCheckpoint<String, i32> = ProcessCheckpoint::new(
            ProcessId::v4(),
            "approved".to_string(),
            42,
            "order",
            Version::new(1, 0, 0),
        );
        let json = checkpoint.to_json().unwrap();
        let back: ProcessCheckpoint<String, i32> = ProcessCheckpoint::from_json(json).unwrap();
        assert_eq!(back.process_id, checkpoint.process_id);
        assert_eq!(back.state, "approved");
        assert_eq!(back.data, 42);
        assert_eq!(back.metadata.process_type, "order");
    }
}
