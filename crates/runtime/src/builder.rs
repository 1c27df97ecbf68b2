//! Wires components together in dependency order.

use std::sync::Arc;

use nebula_error::{Result, RuntimeError};
use nebula_event_storage::EventStore;
use nebula_eventbus::{DomainEvent, EventBus, WILDCARD_TYPE};
use nebula_executor::TaskExecutor;
use nebula_extension::ExtensionRegistry;
use nebula_process::{ProcessData, ProcessManager, ProcessRegistry, ProcessState};
use nebula_scheduler::TaskScheduler;
use nebula_task::TaskRegistry;
use parking_lot::RwLock;

use crate::facade::Runtime;

/// Builds a [`Runtime`], wiring the extension registry, event bus, event
/// store, executor, scheduler, and process manager in dependency order.
///
/// The task and process registries must be supplied explicitly — `build()`
/// fails with `InvalidDefinition` if either is missing.
pub struct RuntimeBuilder<S, D> {
    task_registry: Option<Arc<RwLock<TaskRegistry>>>,
    process_registry: Option<Arc<RwLock<ProcessRegistry<S, D>>>>,
    extensions: Option<Arc<ExtensionRegistry>>,
    bus: Option<Arc<EventBus>>,
    event_store: Option<Arc<EventStore>>,
}

impl<S: ProcessState, D: ProcessData> Default for RuntimeBuilder<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ProcessState, D: ProcessData> RuntimeBuilder<S, D> {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            task_registry: None,
            process_registry: None,
            extensions: None,
            bus: None,
            event_store: None,
        }
    }

    /// Supply the task registry. Required.
    #[must_use]
    pub fn with_task_registry(mut self, registry: Arc<RwLock<TaskRegistry>>) -> Self {
        self.task_registry = Some(registry);
        self
    }

    /// Supply the process registry. Required.
    #[must_use]
    pub fn with_process_registry(mut self, registry: Arc<RwLock<ProcessRegistry<S, D>>>) -> Self {
        self.process_registry = Some(registry);
        self
    }

    /// Supply the extension registry. Defaults to an empty one if absent.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Arc<ExtensionRegistry>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Supply the event bus. Defaults to a fresh bus (sharing this
    /// builder's extension registry) if absent.
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Supply the event store. Defaults to an empty store if absent.
    #[must_use]
    pub fn with_event_store(mut self, store: Arc<EventStore>) -> Self {
        self.event_store = Some(store);
        self
    }

    /// Wire every component and return the assembled [`Runtime`], in
    /// [`crate::state::RuntimeState::Initializing`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::invalid_definition`] if the task or process
    /// registry was never supplied.
    pub fn build(self) -> Result<Runtime<S, D>> {
        let task_registry = self
            .task_registry
            .ok_or_else(|| RuntimeError::invalid_definition("task registry not configured"))?;
        let process_registry = self
            .process_registry
            .ok_or_else(|| RuntimeError::invalid_definition("process registry not configured"))?;
        let extensions = self.extensions.unwrap_or_else(|| Arc::new(ExtensionRegistry::new()));
        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(EventBus::new(Arc::clone(&extensions))));
        let event_store = self.event_store.unwrap_or_else(|| Arc::new(EventStore::new()));

        // Append every published event into storage so `EventSource` replay
        // has something to replay. A plain wildcard subscriber, the same
        // mechanism any other extension-less observer would use.
        let store_sink = Arc::clone(&event_store);
        bus.subscribe(
            WILDCARD_TYPE,
            Arc::new(move |event: &DomainEvent| store_sink.append(event.clone())),
        );

        let executor = Arc::new(TaskExecutor::new(
            Arc::clone(&task_registry),
            Arc::clone(&bus),
            Arc::clone(&extensions),
        ));
        let scheduler = Arc::new(TaskScheduler::new(Arc::clone(&executor)));
        let process_manager = Arc::new(ProcessManager::new(
            Arc::clone(&process_registry),
            Arc::clone(&bus),
            Arc::clone(&extensions),
        ));

        Ok(Runtime::new(
            task_registry,
            process_registry,
            extensions,
            bus,
            event_store,
            executor,
            scheduler,
            process_manager,
        ))
    }
}
