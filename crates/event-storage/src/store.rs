//! Append-only in-memory event store.

use nebula_core::Timestamp;
use nebula_eventbus::DomainEvent;
use parking_lot::RwLock;

/// An ordered, append-only sequence of published events, queryable by type,
/// by correlation id, or in full.
///
/// Backed by `parking_lot::RwLock<Vec<_>>` — storage here is a plain append
/// plus linear scan, not a persistence layer.
#[derive(Default)]
pub struct EventStore {
    events: RwLock<Vec<DomainEvent>>,
}

impl EventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the store.
    pub fn append(&self, event: DomainEvent) {
        self.events.write().push(event);
    }

    /// All events of `event_type`, optionally filtered to
    /// `[start, end]` inclusive by timestamp, in storage order.
    #[must_use]
    pub fn by_type(
        &self,
        event_type: &str,
        range: Option<(Timestamp, Timestamp)>,
    ) -> Vec<DomainEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.event_type == event_type)
            .filter(|event| match range {
                Some((start, end)) => event.timestamp >= start && event.timestamp <= end,
                None => true,
            })
            .cloned()
            .collect()
    }

    /// All events whose `metadata.correlationId` equals `correlation_id`, in
    /// storage order.
    #[must_use]
    pub fn by_correlation_id(&self, correlation_id: &str) -> Vec<DomainEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.metadata.correlation_id() == Some(correlation_id))
            .cloned()
            .collect()
    }

    /// A full dump of every stored event, in storage order.
    #[must_use]
    pub fn all(&self) -> Vec<DomainEvent> {
        self.events.read().clone()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the store holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every stored event.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::Metadata;
    use serde_json::Value;

    #[test]
    fn by_type_filters_and_preserves_order() {
        let store = EventStore::new();
        store.append(DomainEvent::new("a", Value::Null));
        store.append(DomainEvent::new("b", Value::Null));
        store.append(DomainEvent::new("a", Value::Null));

        let events = store.by_type("a", None);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_type == "a"));
    }

    #[test]
    fn by_correlation_id_filters() {
        let store = EventStore::new();
        let mut metadata = Metadata::new();
        metadata.set_correlation_id("corr-1");
        store.append(DomainEvent::new("a", Value::Null).with_metadata(metadata));
        store.append(DomainEvent::new("a", Value::Null));

        let events = store.by_correlation_id("corr-1");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_store_dump_is_empty() {
        let store = EventStore::new();
        assert!(store.all().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_empties_the_store() {
        let store = EventStore::new();
        store.append(DomainEvent::new("a", Value::Null));
        store.append(DomainEvent::new("b", Value::Null));
        store.clear();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }
}
