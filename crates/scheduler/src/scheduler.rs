//! Single-shot delayed dispatch into the task executor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use nebula_core::{ScheduleId, Timestamp};
use nebula_executor::TaskExecutor;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::entry::ScheduledTask;

struct Entry {
    task_type: String,
    input: Value,
    scheduled_time: Timestamp,
    timer: JoinHandle<()>,
}

/// Schedules deferred task dispatches.
///
/// Each entry owns a `tokio::task::JoinHandle` running a `sleep` + dispatch
/// future. Cancelling or rescheduling aborts that handle directly rather
/// than signalling it cooperatively — the timer does no cleanup of its own,
/// so an abort is safe.
pub struct TaskScheduler {
    executor: Arc<TaskExecutor>,
    entries: Arc<RwLock<HashMap<ScheduleId, Entry>>>,
}

impl TaskScheduler {
    /// Construct a scheduler dispatching into `executor`.
    #[must_use]
    pub fn new(executor: Arc<TaskExecutor>) -> Self {
        Self {
            executor,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Arm a single-shot dispatch of `task_type`/`input` at `time`.
    ///
    /// `delay = max(0, time - now)`; a `time` already in the past fires at
    /// the next scheduler tick.
    #[must_use]
    pub fn schedule_task(&self, task_type: impl Into<String>, input: Value, time: Timestamp) -> ScheduleId {
        let task_type = task_type.into();
        let id = ScheduleId::v4();
        let delay_millis = Timestamp::now().millis_until(time).max(0);
        let delay = Duration::from_millis(delay_millis as u64);

        let timer = self.spawn_timer(id, task_type.clone(), input.clone(), delay);

        self.entries.write().insert(
            id,
            Entry {
                task_type,
                input,
                scheduled_time: time,
                timer,
            },
        );
        id
    }

    fn spawn_timer(&self, id: ScheduleId, task_type: String, input: Value, delay: Duration) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Remove before dispatch: the entry must not be observable to
            // `getScheduledTasks`/`cancelScheduledTask` once it has fired,
            // and the executor must not be invoked while holding the lock.
            if entries.write().remove(&id).is_none() {
                return;
            }
            if let Err(err) = executor.execute_task(&task_type, input).await {
                tracing::warn!(schedule_id = %id, task_type, error = %err, "scheduled dispatch failed");
            }
        })
    }

    /// Cancel a pending schedule. Returns `true` if it was present (and is
    /// now cancelled), `false` if no such schedule exists — missing is
    /// success, not error.
    pub fn cancel_scheduled_task(&self, id: ScheduleId) -> bool {
        match self.entries.write().remove(&id) {
            Some(entry) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Rearm an existing schedule for a new time, preserving its task type
    /// and input. Returns `false` if no such schedule exists.
    #[must_use]
    pub fn reschedule_task(&self, id: ScheduleId, new_time: Timestamp) -> bool {
        let Some(entry) = self.entries.write().remove(&id) else {
            return false;
        };
        entry.timer.abort();

        let delay_millis = Timestamp::now().millis_until(new_time).max(0);
        let delay = Duration::from_millis(delay_millis as u64);
        let timer = self.spawn_timer(id, entry.task_type.clone(), entry.input.clone(), delay);

        self.entries.write().insert(
            id,
            Entry {
                task_type: entry.task_type,
                input: entry.input,
                scheduled_time: new_time,
                timer,
            },
        );
        true
    }

    /// Snapshot of all schedules still pending.
    #[must_use]
    pub fn get_scheduled_tasks(&self) -> Vec<ScheduledTask> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| ScheduledTask {
                id: *id,
                task_type: entry.task_type.clone(),
                scheduled_time: entry.scheduled_time,
            })
            .collect()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for entry in self.entries.write().drain() {
            entry.1.timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use nebula_error::Result;
    use nebula_eventbus::EventBus;
    use nebula_extension::ExtensionRegistry;
    use nebula_task::{TaskContext, TaskDefinition, TaskHandler, TaskRegistry};
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    use super::*;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaskHandler for CountingHandler {
        async fn execute(&self, _ctx: TaskContext) -> Result<Value> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"ok": true}))
        }
    }

    fn harness(count: Arc<AtomicUsize>) -> (TaskScheduler, Arc<EventBus>) {
        let mut registry = TaskRegistry::new();
        registry
            .register(TaskDefinition::new("noop", Arc::new(CountingHandler { count })))
            .unwrap();
        let extensions = Arc::new(ExtensionRegistry::new());
        let bus = Arc::new(EventBus::new(Arc::clone(&extensions)));
        let executor = Arc::new(TaskExecutor::new(
            Arc::new(RwLock::new(registry)),
            Arc::clone(&bus),
            extensions,
        ));
        (TaskScheduler::new(executor), bus)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_scheduled_time() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, _bus) = harness(Arc::clone(&count));

        let time = Timestamp::from_millis(Timestamp::now().as_millis() + 50);
        scheduler.schedule_task("noop", Value::Null, time);

        tokio::time::advance(StdDuration::from_millis(60)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(scheduler.get_scheduled_tasks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn s4_cancel_before_fire_prevents_dispatch() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, bus) = harness(Arc::clone(&count));
        let seen = Arc::new(PlMutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        struct Collector(Arc<PlMutex<Vec<String>>>);
        #[async_trait]
        impl nebula_eventbus::EventHandler for Collector {
            async fn handle(&self, event: &nebula_eventbus::DomainEvent) {
                self.0.lock().push(event.event_type.clone());
            }
        }
        bus.subscribe(nebula_eventbus::WILDCARD_TYPE, Arc::new(Collector(seen_clone)));

        let time = Timestamp::from_millis(Timestamp::now().as_millis() + 100);
        let id = scheduler.schedule_task("noop", Value::Null, time);

        tokio::time::advance(StdDuration::from_millis(50)).await;
        assert!(scheduler.cancel_scheduled_task(id));

        tokio::time::advance(StdDuration::from_millis(100)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!seen.lock().iter().any(|t| t == "task.created"));
        assert!(!scheduler.cancel_scheduled_task(id));
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_preserves_task_type_and_rearms() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, _bus) = harness(Arc::clone(&count));

        let time = Timestamp::from_millis(Timestamp::now().as_millis() + 200);
        let id = scheduler.schedule_task("noop", Value::Null, time);

        let new_time = Timestamp::from_millis(Timestamp::now().as_millis() + 30);
        assert!(scheduler.reschedule_task(id, new_time));

        tokio::time::advance(StdDuration::from_millis(40)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reschedule_missing_id_returns_false() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, _bus) = harness(count);
        assert!(!scheduler.reschedule_task(ScheduleId::v4(), Timestamp::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn past_time_fires_at_next_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, _bus) = harness(Arc::clone(&count));

        let past = Timestamp::from_millis(Timestamp::now().as_millis() - 1000);
        scheduler.schedule_task("noop", Value::Null, past);

        tokio::time::advance(StdDuration::from_millis(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
