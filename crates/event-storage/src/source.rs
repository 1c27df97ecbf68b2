//! Replay of stored events back through the bus.

use nebula_core::Timestamp;
use nebula_error::Result;
use nebula_eventbus::{DomainEvent, EventBus};

use crate::store::EventStore;

/// Republishes stored events through an [`EventBus`], marking each as a
/// replay.
pub struct EventSource<'a> {
    store: &'a EventStore,
    bus: &'a EventBus,
}

impl<'a> EventSource<'a> {
    /// Pair a store with the bus replayed events should be republished on.
    #[must_use]
    pub fn new(store: &'a EventStore, bus: &'a EventBus) -> Self {
        Self { store, bus }
    }

    /// Replay every event of `event_type`, optionally bounded by
    /// `[start, end]`, in timestamp-ascending order. Empty sets succeed as a
    /// no-op.
    pub async fn replay_by_type(
        &self,
        event_type: &str,
        range: Option<(Timestamp, Timestamp)>,
    ) -> Result<()> {
        let mut events = self.store.by_type(event_type, range);
        events.sort_by_key(|event| event.timestamp);
        self.replay_ordered(events).await
    }

    /// Replay every event sharing `correlation_id`, in timestamp-ascending
    /// order.
    pub async fn replay_by_correlation_id(&self, correlation_id: &str) -> Result<()> {
        let mut events = self.store.by_correlation_id(correlation_id);
        events.sort_by_key(|event| event.timestamp);
        self.replay_ordered(events).await
    }

    async fn replay_ordered(&self, events: Vec<DomainEvent>) -> Result<()> {
        for mut event in events {
            event.mark_replayed();
            self.bus.publish(event).await?;
        }
        Ok(())
    }
}
