//! The event envelope published on the bus.

use nebula_core::{EventId, Metadata, Timestamp};
use serde_json::Value;

/// A single published event.
///
/// Invariants: `id` is unique per bus instance; `type` is stable across
/// publish/store/replay; a replayed event has `metadata.replayed = true`
/// and `metadata.replayTimestamp` set.
#[derive(Debug, Clone)]
pub struct DomainEvent {
    /// Unique id, generated at construction.
    pub id: EventId,
    /// Stable event-type discriminant, e.g. `"task.completed"`.
    pub event_type: String,
    /// When the event was created.
    pub timestamp: Timestamp,
    /// Event payload.
    pub payload: Value,
    /// Opaque metadata, including `correlationId` and replay markers.
    pub metadata: Metadata,
}

impl DomainEvent {
    /// Construct a new event of the given type with an empty metadata map
    /// and a freshly generated id/timestamp.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: EventId::v4(),
            event_type: event_type.into(),
            timestamp: Timestamp::now(),
            payload,
            metadata: Metadata::new(),
        }
    }

    /// Builder-style metadata attachment.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Mark this event as a replay, rewriting `metadata.replayed=true` and
    /// `metadata.replayTimestamp=now`.
    pub fn mark_replayed(&mut self) {
        self.metadata.insert("replayed", true);
        self.metadata
            .insert("replayTimestamp", Timestamp::now().as_millis());
    }

    /// `true` if this event's type is the reserved wildcard subscription key
    /// (`"*"`). Nothing stops a caller from constructing one this way, but
    /// publishing it would match both the typed and wildcard subscriber
    /// lookups in [`crate::bus::EventBus::deliver`] and double-deliver, so
    /// [`crate::bus::EventBus::publish`] rejects it before it reaches the
    /// subscriber list.
    #[must_use]
    pub fn is_wildcard_type(&self) -> bool {
        self.event_type == WILDCARD_TYPE
    }
}

/// The reserved subscription key that receives every published event type.
pub const WILDCARD_TYPE: &str = "*";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_event_has_fresh_id() {
        let a = DomainEvent::new("task.created", Value::Null);
        let b = DomainEvent::new("task.created", Value::Null);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn mark_replayed_sets_metadata() {
        let mut event = DomainEvent::new("task.completed", Value::Null);
        assert!(event.metadata.get("replayed").is_none());
        event.mark_replayed();
        assert_eq!(event.metadata.get("replayed"), Some(&Value::Bool(true)));
        assert!(event.metadata.get("replayTimestamp").is_some());
    }

    #[test]
    fn wildcard_type_constant() {
        let event = DomainEvent::new(WILDCARD_TYPE, Value::Null);
        assert!(event.is_wildcard_type());
    }
}
