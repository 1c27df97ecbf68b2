//! Opaque key/value metadata attached to events, executions, and instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The well-known metadata key used to group related events for replay.
pub const CORRELATION_ID_KEY: &str = "correlationId";

/// A mapping from string key to arbitrary JSON value.
///
/// Never interpreted by the core except where explicitly called out (e.g.
/// `correlationId`). Ordered (`BTreeMap`) so serialized output and
/// iteration order are deterministic, which keeps snapshot tests stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// An empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Read a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a key, returning its prior value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// `true` if no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `correlationId` field, if present and a JSON string.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.get(CORRELATION_ID_KEY).and_then(Value::as_str)
    }

    /// Set the `correlationId` field.
    pub fn set_correlation_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.insert(CORRELATION_ID_KEY, Value::String(id.into()))
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for Metadata {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut meta = Metadata::new();
        meta.insert("retried", true);
        assert_eq!(meta.get("retried"), Some(&Value::Bool(true)));
    }

    #[test]
    fn correlation_id_roundtrip() {
        let mut meta = Metadata::new();
        assert!(meta.correlation_id().is_none());
        meta.set_correlation_id("corr-1");
        assert_eq!(meta.correlation_id(), Some("corr-1"));
    }

    #[test]
    fn remove_returns_prior_value() {
        let mut meta = Metadata::new();
        meta.insert("a", 1);
        let removed = meta.remove("a");
        assert_eq!(removed, Some(Value::from(1)));
        assert!(meta.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let mut meta = Metadata::new();
        meta.insert("replayed", true);
        meta.insert("replayTimestamp", 1_700_000_000_000i64);
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
