#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Runtime
//!
//! The runtime facade: holds references to every core component (event bus,
//! extension registry, event storage, task registry/executor/scheduler,
//! process registry/manager), drives the runtime's own
//! `initializing → initialized → running → stopped` lifecycle, and reports
//! health and on-demand metrics.

mod builder;
mod facade;
mod metrics;
mod state;

pub use builder::RuntimeBuilder;
pub use facade::Runtime;
pub use metrics::RuntimeMetrics;
pub use state::{Health, RuntimeState};

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_process::ProcessRegistry;
    use nebula_task::TaskRegistry;
    use parking_lot::RwLock;
    use serde_json::Value;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    enum OrderState {
        Created,
    }

    fn runtime() -> Runtime<OrderState, Value> {
        RuntimeBuilder::new()
            .with_task_registry(Arc::new(RwLock::new(TaskRegistry::new())))
            .with_process_registry(Arc::new(RwLock::new(ProcessRegistry::new())))
            .build()
            .unwrap()
    }

    #[test]
    fn lifecycle_transitions_in_order() {
        let runtime = runtime();
        assert_eq!(runtime.get_health(), Health::Degraded);

        runtime.init().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Initialized);
        assert_eq!(runtime.get_health(), Health::Degraded);

        runtime.start().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Running);
        assert_eq!(runtime.get_health(), Health::Healthy);

        runtime.stop().unwrap();
        assert_eq!(runtime.state(), RuntimeState::Stopped);
        assert_eq!(runtime.get_health(), Health::Degraded);
    }

    #[test]
    fn start_without_init_is_an_invalid_transition() {
        let runtime = runtime();
        assert!(runtime.start().is_err());
    }

    #[test]
    fn mark_unhealthy_is_sticky_across_states() {
        let runtime = runtime();
        runtime.init().unwrap();
        runtime.start().unwrap();
        runtime.mark_unhealthy();
        assert_eq!(runtime.get_health(), Health::Unhealthy);
        runtime.stop().unwrap();
        assert_eq!(runtime.get_health(), Health::Unhealthy);
    }

    #[test]
    fn metrics_reflect_executor_and_scheduler_state() {
        let runtime = runtime();
        let metrics = runtime.metrics();
        assert_eq!(metrics.running_count, 0);
        assert_eq!(metrics.scheduled_count, 0);
        assert!(metrics.tasks_by_status.is_empty());
    }

    #[tokio::test]
    async fn published_events_land_in_the_event_store_and_replay() {
        use nebula_task::{TaskDefinition, TypedTaskHandler};
        use serde_json::{json, Value as Json};

        let runtime = runtime();
        let handler = TypedTaskHandler::new(|_ctx, _input: Json| async move { Ok(json!("ok")) });
        runtime
            .task_registry()
            .write()
            .register(TaskDefinition::new("t", Arc::new(handler)))
            .unwrap();

        runtime.executor().execute_task("t", Json::Null).await.unwrap();

        assert!(runtime.event_store().len() >= 3, "created/started/completed should be stored");
        assert!(!runtime.event_store().by_type("task.completed", None).is_empty());

        let replayed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let r = replayed.clone();
        runtime.event_bus().subscribe(
            "task.completed",
            Arc::new(move |event: &nebula_eventbus::DomainEvent| {
                r.lock().push(event.metadata.get("replayed").cloned());
            }),
        );

        runtime.replay_by_type("task.completed", None).await.unwrap();

        let replayed = replayed.lock();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0], Some(Json::Bool(true)));
    }
}
