//! The event bus itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nebula_core::SubscriptionId;
use nebula_error::Result;
use nebula_extension::{ExtensionPoint, ExtensionRegistry, HookOutcome};
use parking_lot::RwLock;
use serde_json::json;

use crate::backpressure::BackpressureStrategy;
use crate::event::{DomainEvent, WILDCARD_TYPE};
use crate::handler::EventHandler;

struct Subscription {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct TypeDepth {
    current: AtomicUsize,
}

/// Typed pub/sub distribution for [`DomainEvent`]s.
///
/// Implements a five-step publish protocol: before-hooks, backpressure,
/// delivery (type subscribers then wildcard, in registration order),
/// after-hooks, depth decrement. Subscriber state lives behind a
/// `parking_lot::RwLock`.
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Subscription>>>,
    depths: RwLock<HashMap<String, Arc<TypeDepth>>>,
    backpressure: RwLock<HashMap<String, Arc<dyn BackpressureStrategy>>>,
    extensions: Arc<ExtensionRegistry>,
}

impl EventBus {
    /// Construct a bus sharing the given extension registry for
    /// `EVENT_BEFORE_PUBLISH`/`EVENT_AFTER_PUBLISH` hooks.
    #[must_use]
    pub fn new(extensions: Arc<ExtensionRegistry>) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            depths: RwLock::new(HashMap::new()),
            backpressure: RwLock::new(HashMap::new()),
            extensions,
        }
    }

    /// Subscribe `handler` to `event_type` (or [`WILDCARD_TYPE`] for every
    /// type). Returns an opaque handle usable with [`Self::unsubscribe`].
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId::v4();
        self.subscribers
            .write()
            .entry(event_type.into())
            .or_default()
            .push(Subscription { id, handler });
        id
    }

    /// Remove a previously registered subscription. Idempotent with set
    /// semantics: removing an `id` that isn't currently subscribed to
    /// anything is a no-op, not an error (unlike the task registry's
    /// `unregister`, whose keyed definition map does fail `NotFound` on a
    /// missing key).
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        for handlers in subscribers.values_mut() {
            if let Some(pos) = handlers.iter().position(|sub| sub.id == id) {
                handlers.remove(pos);
                break;
            }
        }
        Ok(())
    }

    /// Install a backpressure strategy gating `event_type` (or
    /// [`WILDCARD_TYPE`] to gate every type uniformly).
    pub fn set_backpressure(
        &self,
        event_type: impl Into<String>,
        strategy: Arc<dyn BackpressureStrategy>,
    ) {
        self.backpressure.write().insert(event_type.into(), strategy);
    }

    fn depth_for(&self, event_type: &str) -> Arc<TypeDepth> {
        self.depths
            .write()
            .entry(event_type.to_string())
            .or_insert_with(|| Arc::new(TypeDepth::default()))
            .clone()
    }

    fn admits(&self, event_type: &str, depth: usize) -> bool {
        let backpressure = self.backpressure.read();
        let type_ok = backpressure
            .get(event_type)
            .is_none_or(|strategy| strategy.should_accept(depth));
        let wildcard_ok = backpressure
            .get(WILDCARD_TYPE)
            .is_none_or(|strategy| strategy.should_accept(depth));
        type_ok && wildcard_ok
    }

    fn record(&self, event_type: &str, accepted: bool) {
        let backpressure = self.backpressure.read();
        if let Some(strategy) = backpressure.get(event_type) {
            strategy.record(accepted);
        }
        if let Some(strategy) = backpressure.get(WILDCARD_TYPE) {
            strategy.record(accepted);
        }
    }

    /// Publish `event`, running the full five-step protocol.
    ///
    /// # Errors
    ///
    /// Returns [`nebula_error::RuntimeError::invalid_definition`] if
    /// `event`'s type is the reserved wildcard key (see
    /// [`DomainEvent::is_wildcard_type`]).
    pub async fn publish(&self, mut event: DomainEvent) -> Result<()> {
        if event.is_wildcard_type() {
            return Err(nebula_error::RuntimeError::invalid_definition(
                "cannot publish an event typed as the reserved wildcard subscription key",
            ));
        }

        let before_params = json!({
            "eventId": event.id.to_string(),
            "eventType": event.event_type,
            "payload": event.payload,
        });
        match self
            .extensions
            .execute(ExtensionPoint::EventBeforePublish, before_params)
            .await?
        {
            HookOutcome::Continue(params) => {
                if let Some(payload) = params.get("payload") {
                    event.payload = payload.clone();
                }
            }
            HookOutcome::Skip { .. } => {
                tracing::debug!(event_type = %event.event_type, "publish skipped by before-hook");
                return Ok(());
            }
        }

        let depth = self.depth_for(&event.event_type);
        let current = depth.current.load(Ordering::Acquire);
        if !self.admits(&event.event_type, current) {
            self.record(&event.event_type, false);
            tracing::warn!(event_type = %event.event_type, %current, "event dropped by backpressure");
            return Ok(());
        }
        self.record(&event.event_type, true);
        depth.current.fetch_add(1, Ordering::AcqRel);

        self.deliver(&event).await;

        let after_params = json!({
            "eventId": event.id.to_string(),
            "eventType": event.event_type,
        });
        if let Err(err) = self
            .extensions
            .execute(ExtensionPoint::EventAfterPublish, after_params)
            .await
        {
            tracing::warn!(event_type = %event.event_type, error = %err, "after-publish hook failed");
        }

        depth.current.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }

    async fn deliver(&self, event: &DomainEvent) {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscribers = self.subscribers.read();
            let mut handlers = Vec::new();
            if let Some(typed) = subscribers.get(&event.event_type) {
                handlers.extend(typed.iter().map(|sub| sub.handler.clone()));
            }
            if let Some(wildcard) = subscribers.get(WILDCARD_TYPE) {
                handlers.extend(wildcard.iter().map(|sub| sub.handler.clone()));
            }
            handlers
        };

        for handler in handlers {
            handler.handle(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backpressure::MaxDepth;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    fn bus() -> EventBus {
        EventBus::new(Arc::new(ExtensionRegistry::new()))
    }

    #[tokio::test]
    async fn delivers_to_typed_then_wildcard_subscribers_in_order() {
        let bus = bus();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        bus.subscribe(
            "task.created",
            Arc::new(move |_: &DomainEvent| o1.lock().push("typed")),
        );
        let o2 = order.clone();
        bus.subscribe(
            WILDCARD_TYPE,
            Arc::new(move |_: &DomainEvent| o2.lock().push("wildcard")),
        );

        bus.publish(DomainEvent::new("task.created", Value::Null))
            .await
            .unwrap();

        assert_eq!(*order.lock(), vec!["typed", "wildcard"]);
    }

    #[tokio::test]
    async fn unrelated_type_is_not_delivered() {
        let bus = bus();
        let hit = Arc::new(Mutex::new(false));
        let h = hit.clone();
        bus.subscribe("task.created", Arc::new(move |_: &DomainEvent| *h.lock() = true));

        bus.publish(DomainEvent::new("task.failed", Value::Null))
            .await
            .unwrap();

        assert!(!*hit.lock());
    }

    #[tokio::test]
    async fn backpressure_drops_silently() {
        let bus = bus();
        bus.set_backpressure("hot", Arc::new(MaxDepth::new(0)));
        let hit = Arc::new(Mutex::new(false));
        let h = hit.clone();
        bus.subscribe("hot", Arc::new(move |_: &DomainEvent| *h.lock() = true));

        bus.publish(DomainEvent::new("hot", Value::Null)).await.unwrap();

        assert!(!*hit.lock());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = bus();
        let hit = Arc::new(Mutex::new(false));
        let h = hit.clone();
        let id = bus.subscribe("x", Arc::new(move |_: &DomainEvent| *h.lock() = true));
        bus.unsubscribe(id).unwrap();

        bus.publish(DomainEvent::new("x", Value::Null)).await.unwrap();

        assert!(!*hit.lock());
    }

    #[tokio::test]
    async fn unsubscribe_unknown_is_a_no_op() {
        let bus = bus();
        assert!(bus.unsubscribe(SubscriptionId::v4()).is_ok());
    }

    #[tokio::test]
    async fn publishing_the_wildcard_type_is_rejected() {
        let bus = bus();
        let result = bus.publish(DomainEvent::new(WILDCARD_TYPE, Value::Null)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn s6_before_publish_hook_modifies_payload() {
        let mut extensions = ExtensionRegistry::new();
        extensions.register(
            ExtensionPoint::EventBeforePublish,
            0,
            Arc::new(|mut params: serde_json::Value| {
                params["payload"]["intercepted"] = Value::Bool(true);
                Ok(HookOutcome::Continue(params))
            }),
        );
        let bus = EventBus::new(Arc::new(extensions));

        let received = Arc::new(Mutex::new(None));
        let r = received.clone();
        bus.subscribe(
            "t",
            Arc::new(move |event: &DomainEvent| *r.lock() = Some(event.payload.clone())),
        );

        bus.publish(DomainEvent::new("t", json!({"orig": true})))
            .await
            .unwrap();

        assert_eq!(
            received.lock().clone().unwrap(),
            json!({"orig": true, "intercepted": true})
        );
    }
}
