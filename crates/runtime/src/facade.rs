//! The runtime facade itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nebula_core::Timestamp;
use nebula_error::{Result, RuntimeError};
use nebula_event_storage::{EventSource, EventStore};
use nebula_eventbus::EventBus;
use nebula_executor::TaskExecutor;
use nebula_extension::ExtensionRegistry;
use nebula_process::{ProcessData, ProcessManager, ProcessRegistry, ProcessState};
use nebula_scheduler::TaskScheduler;
use nebula_task::TaskRegistry;
use parking_lot::RwLock;

use crate::metrics::RuntimeMetrics;
use crate::state::{Health, RuntimeState};

/// Holds references to every core component and drives the runtime's own
/// `initializing → initialized → running → stopped` lifecycle.
///
/// Construct through [`crate::RuntimeBuilder`]; the builder wires components
/// in dependency order and validates that the required ones are present
/// before handing back a `Runtime`.
pub struct Runtime<S, D> {
    task_registry: Arc<RwLock<TaskRegistry>>,
    process_registry: Arc<RwLock<ProcessRegistry<S, D>>>,
    extensions: Arc<ExtensionRegistry>,
    bus: Arc<EventBus>,
    event_store: Arc<EventStore>,
    executor: Arc<TaskExecutor>,
    scheduler: Arc<TaskScheduler>,
    process_manager: Arc<ProcessManager<S, D>>,
    state: RwLock<RuntimeState>,
    failed: AtomicBool,
}

impl<S: ProcessState, D: ProcessData> Runtime<S, D> {
    pub(crate) fn new(
        task_registry: Arc<RwLock<TaskRegistry>>,
        process_registry: Arc<RwLock<ProcessRegistry<S, D>>>,
        extensions: Arc<ExtensionRegistry>,
        bus: Arc<EventBus>,
        event_store: Arc<EventStore>,
        executor: Arc<TaskExecutor>,
        scheduler: Arc<TaskScheduler>,
        process_manager: Arc<ProcessManager<S, D>>,
    ) -> Self {
        Self {
            task_registry,
            process_registry,
            extensions,
            bus,
            event_store,
            executor,
            scheduler,
            process_manager,
            state: RwLock::new(RuntimeState::Initializing),
            failed: AtomicBool::new(false),
        }
    }

    /// The shared task-type registry.
    #[must_use]
    pub fn task_registry(&self) -> &Arc<RwLock<TaskRegistry>> {
        &self.task_registry
    }

    /// The shared process-definition registry.
    #[must_use]
    pub fn process_registry(&self) -> &Arc<RwLock<ProcessRegistry<S, D>>> {
        &self.process_registry
    }

    /// The shared extension registry.
    #[must_use]
    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    /// The shared event bus.
    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The shared event store.
    #[must_use]
    pub fn event_store(&self) -> &Arc<EventStore> {
        &self.event_store
    }

    /// The task executor.
    #[must_use]
    pub fn executor(&self) -> &Arc<TaskExecutor> {
        &self.executor
    }

    /// The task scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    /// The process manager.
    #[must_use]
    pub fn process_manager(&self) -> &Arc<ProcessManager<S, D>> {
        &self.process_manager
    }

    /// The runtime's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RuntimeState {
        *self.state.read()
    }

    /// Transition `initializing -> initialized`.
    pub fn init(&self) -> Result<()> {
        self.transition(RuntimeState::Initializing, RuntimeState::Initialized)
    }

    /// Transition `initialized -> running`.
    pub fn start(&self) -> Result<()> {
        self.transition(RuntimeState::Initialized, RuntimeState::Running)
    }

    /// Transition `initialized` or `running` -> `stopped`.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.write();
        if !matches!(*state, RuntimeState::Initialized | RuntimeState::Running) {
            return Err(RuntimeError::invalid_transition(*state, RuntimeState::Stopped));
        }
        tracing::info!(from = %*state, to = %RuntimeState::Stopped, "runtime stopping");
        *state = RuntimeState::Stopped;
        Ok(())
    }

    fn transition(&self, from: RuntimeState, to: RuntimeState) -> Result<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(RuntimeError::invalid_transition(*state, to));
        }
        tracing::info!(from = %from, to = %to, "runtime transitioning");
        *state = to;
        Ok(())
    }

    /// Flag the runtime unhealthy after an unrecoverable component failure.
    /// Sticky: once set, [`Self::get_health`] reports
    /// [`Health::Unhealthy`] regardless of lifecycle state until the process
    /// is recreated.
    pub fn mark_unhealthy(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Report the runtime's health: `healthy` only while `running`,
    /// `degraded` while `initializing`/`initialized`/`stopped`, `unhealthy`
    /// once a component failure has been flagged.
    #[must_use]
    pub fn get_health(&self) -> Health {
        if self.failed.load(Ordering::Acquire) {
            return Health::Unhealthy;
        }
        match self.state() {
            RuntimeState::Running => Health::Healthy,
            RuntimeState::Initializing | RuntimeState::Initialized | RuntimeState::Stopped => {
                Health::Degraded
            }
        }
    }

    /// A fresh snapshot of task counts by status, running count, and
    /// scheduled count.
    #[must_use]
    pub fn metrics(&self) -> RuntimeMetrics {
        RuntimeMetrics {
            tasks_by_status: self.executor.status_counts(),
            running_count: self.executor.running_count(),
            scheduled_count: self.scheduler.get_scheduled_tasks().len(),
        }
    }

    /// Replay stored events of `event_type` back through the bus.
    pub async fn replay_by_type(
        &self,
        event_type: &str,
        range: Option<(Timestamp, Timestamp)>,
    ) -> Result<()> {
        EventSource::new(&self.event_store, &self.bus)
            .replay_by_type(event_type, range)
            .await
    }

    /// Replay every stored event sharing `correlation_id` back through the
    /// bus.
    pub async fn replay_by_correlation_id(&self, correlation_id: &str) -> Result<()> {
        EventSource::new(&self.event_store, &self.bus)
            .replay_by_correlation_id(correlation_id)
            .await
    }
}
