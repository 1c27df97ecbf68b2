//! The task executor: lookup, dependency gating, and the retry loop.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_core::TaskExecutionId;
use nebula_error::{Result, RuntimeError};
use nebula_eventbus::{DomainEvent, EventBus};
use nebula_extension::{ExtensionPoint, ExtensionRegistry, HookOutcome};
use nebula_task::{TaskContext, TaskHandler, TaskRegistry};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::execution::{TaskError, TaskExecution};
use crate::status::TaskStatus;

struct RunningTask {
    token: CancellationToken,
}

/// Executes registered tasks: resolves the definition, runs the retry loop,
/// and emits lifecycle events through the [`EventBus`]. Exclusively owns the
/// running-tasks index and the execution store.
pub struct TaskExecutor {
    registry: Arc<RwLock<TaskRegistry>>,
    bus: Arc<EventBus>,
    extensions: Arc<ExtensionRegistry>,
    executions: RwLock<HashMap<TaskExecutionId, TaskExecution>>,
    running: RwLock<HashMap<TaskExecutionId, RunningTask>>,
}

impl TaskExecutor {
    /// Construct an executor sharing the given task registry, event bus, and
    /// extension registry.
    #[must_use]
    pub fn new(
        registry: Arc<RwLock<TaskRegistry>>,
        bus: Arc<EventBus>,
        extensions: Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            registry,
            bus,
            extensions,
            executions: RwLock::new(HashMap::new()),
            running: RwLock::new(HashMap::new()),
        }
    }

    /// Run `task_type` with `input`.
    pub async fn execute_task(&self, task_type: &str, input: Value) -> Result<TaskExecution> {
        self.execute(task_type, input, &[]).await
    }

    /// Run `task_type` with `input`, gated on the completion of every
    /// execution in `dependency_ids`.
    pub async fn execute_task_with_dependencies(
        &self,
        task_type: &str,
        input: Value,
        dependency_ids: &[TaskExecutionId],
    ) -> Result<TaskExecution> {
        self.execute(task_type, input, dependency_ids).await
    }

    async fn execute(
        &self,
        task_type: &str,
        mut input: Value,
        dependency_ids: &[TaskExecutionId],
    ) -> Result<TaskExecution> {
        let definition = self.registry.read().get(task_type)?;

        let mut dependency_results: Option<Value> = None;
        if !dependency_ids.is_empty() {
            let mut previous_results = serde_json::Map::new();
            for dep_id in dependency_ids {
                let executions = self.executions.read();
                let dep = executions
                    .get(dep_id)
                    .ok_or_else(|| RuntimeError::dependency_unsatisfied(dep_id))?;
                if dep.status != TaskStatus::Completed {
                    return Err(RuntimeError::dependency_unsatisfied(dep_id));
                }
                previous_results.insert(
                    dep_id.to_string(),
                    dep.result.clone().unwrap_or(Value::Null),
                );
            }
            let previous_results = Value::Object(previous_results);
            if let Value::Object(map) = &mut input {
                map.insert("previousResults".to_string(), previous_results.clone());
            }
            dependency_results = Some(previous_results);
        }

        let mut execution = TaskExecution::new(task_type, input.clone());
        if !dependency_ids.is_empty() {
            execution = execution.with_depends_on(dependency_ids.to_vec());
        }
        let execution_id = execution.id;
        self.executions.write().insert(execution_id, execution.clone());
        self.publish_lifecycle("task.created", &execution).await;

        let token = CancellationToken::new();
        self.running
            .write()
            .insert(execution_id, RunningTask { token: token.clone() });

        let policy = definition.retry_policy.clone();
        let max_attempts = policy.as_ref().map_or(1, |p| p.max_attempts).max(1);
        let mut previous_error: Option<TaskError> = None;

        for attempt in 1..=max_attempts {
            if token.is_cancelled() {
                if self.snapshot(execution_id).status != TaskStatus::Cancelled {
                    self.finish_cancelled(execution_id).await;
                }
                return Ok(self.snapshot(execution_id));
            }

            self.mark_running(execution_id, attempt);
            tracing::debug!(%execution_id, task_type, attempt, "task attempt starting");
            self.publish_lifecycle("task.started", &self.snapshot(execution_id))
                .await;

            let before_params = json!({
                "taskExecutionId": execution_id.to_string(),
                "taskType": task_type,
                "attempt": attempt,
            });
            match self
                .extensions
                .execute(ExtensionPoint::TaskBeforeExecution, before_params)
                .await?
            {
                HookOutcome::Skip { result } => {
                    self.finish_completed(execution_id, result).await;
                    self.running.write().remove(&execution_id);
                    return Ok(self.snapshot(execution_id));
                }
                HookOutcome::Continue(_) => {}
            }

            let mut ctx = TaskContext::new(execution.input.clone(), token.clone());
            ctx.attempt_number = attempt;
            ctx.previous_error = previous_error.as_ref().map(|err| err.message.clone());
            ctx.previous_results.clone_from(&dependency_results);

            let outcome = match definition.timeout {
                Some(timeout) if !timeout.is_zero() => {
                    tokio::select! {
                        result = definition.handler.execute(ctx) => {
                            result.map_err(|err| TaskError::handler_failure(err.to_string()))
                        }
                        () = tokio::time::sleep(timeout) => {
                            token.cancel();
                            Err(TaskError::timeout())
                        }
                    }
                }
                _ => definition
                    .handler
                    .execute(ctx)
                    .await
                    .map_err(|err| TaskError::handler_failure(err.to_string())),
            };

            match outcome {
                Ok(result) => {
                    // A concurrent `cancel_task` may have flipped the token
                    // while the handler was finishing its last poll; honor
                    // that over the late success so `task.cancelled` is
                    // never followed by a `task.completed` for the same
                    // execution.
                    if token.is_cancelled() {
                        self.running.write().remove(&execution_id);
                        return Ok(self.snapshot(execution_id));
                    }
                    self.finish_completed(execution_id, result).await;
                    self.running.write().remove(&execution_id);
                    return Ok(self.snapshot(execution_id));
                }
                Err(task_error) => {
                    let retry_on_timeout = policy.as_ref().is_some_and(|p| p.retry_on_timeout);
                    let timeout_kind_allowed = policy.as_ref().is_some_and(|p| {
                        p.retryable_error_kinds
                            .as_ref()
                            .is_some_and(|kinds| kinds.iter().any(|k| task_error.matches_code(k)))
                    });
                    let blocked_by_timeout =
                        task_error.is_timeout() && !retry_on_timeout && !timeout_kind_allowed;
                    let blocked_by_kind = policy.as_ref().is_some_and(|p| {
                        p.retryable_error_kinds.as_ref().is_some_and(|kinds| {
                            !kinds.iter().any(|k| task_error.matches_code(k))
                        })
                    });
                    let will_retry =
                        !blocked_by_timeout && !blocked_by_kind && attempt < max_attempts;

                    previous_error = Some(task_error.clone());
                    self.mark_failed(execution_id, task_error, !will_retry);
                    let failed_execution = self.snapshot(execution_id);
                    self.publish_lifecycle("task.failed", &failed_execution).await;

                    let on_error_params = json!({
                        "taskExecutionId": execution_id.to_string(),
                        "taskType": task_type,
                        "attemptNumber": attempt,
                        "error": failed_execution.error,
                    });
                    if let Err(err) = self
                        .extensions
                        .execute(ExtensionPoint::TaskOnError, on_error_params)
                        .await
                    {
                        tracing::warn!(%execution_id, error = %err, "TASK_ON_ERROR hook failed");
                    }

                    if !will_retry {
                        break;
                    }

                    let delay = policy
                        .as_ref()
                        .map_or(std::time::Duration::ZERO, |p| p.compute_delay(attempt));
                    let retry_params = json!({
                        "taskExecutionId": execution_id.to_string(),
                        "taskType": task_type,
                        "attemptNumber": attempt,
                        "nextAttempt": attempt + 1,
                    });
                    self.bus
                        .publish(DomainEvent::new("task:retryAttempt", retry_params))
                        .await
                        .ok();
                    tokio::time::sleep(delay).await;
                }
            }
        }

        self.running.write().remove(&execution_id);
        Ok(self.snapshot(execution_id))
    }

    /// Request cancellation of a running execution. A no-op if the
    /// execution already finished.
    pub async fn cancel_task(&self, execution_id: TaskExecutionId) -> Result<()> {
        let token = {
            let running = self.running.read();
            running.get(&execution_id).map(|r| r.token.clone())
        };
        let Some(token) = token else {
            return Ok(());
        };
        token.cancel();
        self.finish_cancelled(execution_id).await;
        self.running.write().remove(&execution_id);
        Ok(())
    }

    /// Read the current snapshot of an execution.
    pub fn get_task_status(&self, execution_id: TaskExecutionId) -> Result<TaskExecution> {
        self.executions
            .read()
            .get(&execution_id)
            .cloned()
            .ok_or_else(|| RuntimeError::not_found("task execution", execution_id))
    }

    /// Count of known executions grouped by status, for
    /// [`nebula_runtime`](https://docs.rs/nebula-runtime)'s metrics snapshot.
    #[must_use]
    pub fn status_counts(&self) -> HashMap<TaskStatus, u64> {
        let mut counts = HashMap::new();
        for execution in self.executions.read().values() {
            *counts.entry(execution.status).or_insert(0) += 1;
        }
        counts
    }

    /// Number of executions currently tracked as running.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.running.read().len()
    }

    fn snapshot(&self, execution_id: TaskExecutionId) -> TaskExecution {
        self.executions
            .read()
            .get(&execution_id)
            .cloned()
            .expect("execution inserted before any snapshot is taken")
    }

    fn mark_running(&self, execution_id: TaskExecutionId, attempt: u32) {
        let mut executions = self.executions.write();
        if let Some(execution) = executions.get_mut(&execution_id) {
            execution.status = TaskStatus::Running;
            execution.attempt_number = attempt;
            if execution.started_at.is_none() {
                execution.started_at = Some(nebula_core::Timestamp::now());
            }
        }
    }

    /// Record an attempt failure. When `terminal` is `true` the execution's
    /// status settles on `failed` and `completedAt` is stamped; otherwise the
    /// failure is transient (a retry follows) and `completedAt` stays unset.
    fn mark_failed(&self, execution_id: TaskExecutionId, error: TaskError, terminal: bool) {
        let mut executions = self.executions.write();
        if let Some(execution) = executions.get_mut(&execution_id) {
            execution.error = Some(error);
            execution.status = TaskStatus::Failed;
            if terminal {
                execution.completed_at = Some(nebula_core::Timestamp::now());
            }
        }
    }

    /// Commits a success outcome, unless a concurrent [`Self::cancel_task`]
    /// already won the race and settled the execution on `Cancelled` — that
    /// terminal status, once committed, is never overwritten.
    async fn finish_completed(&self, execution_id: TaskExecutionId, result: Value) {
        let committed = {
            let mut executions = self.executions.write();
            match executions.get_mut(&execution_id) {
                Some(execution) if execution.status != TaskStatus::Cancelled => {
                    execution.status = TaskStatus::Completed;
                    execution.result = Some(result);
                    execution.error = None;
                    execution.completed_at = Some(nebula_core::Timestamp::now());
                    true
                }
                _ => false,
            }
        };
        if !committed {
            return;
        }
        tracing::info!(%execution_id, "task completed");
        let execution = self.snapshot(execution_id);
        self.publish_lifecycle("task.completed", &execution).await;

        let after_params = json!({
            "taskExecutionId": execution.id.to_string(),
            "taskType": execution.task_type,
            "result": execution.result,
        });
        if let Err(err) = self
            .extensions
            .execute(ExtensionPoint::TaskAfterCompletion, after_params)
            .await
        {
            tracing::warn!(%execution_id, error = %err, "TASK_AFTER_COMPLETION hook failed");
        }
    }

    /// Commits a cancellation, unless the execution already settled on a
    /// terminal status (completed or failed) — cancelling a task that has
    /// already finished is a no-op, not a status override.
    async fn finish_cancelled(&self, execution_id: TaskExecutionId) {
        let committed = {
            let mut executions = self.executions.write();
            match executions.get_mut(&execution_id) {
                Some(execution) if !execution.status.is_terminal() => {
                    execution.status = TaskStatus::Cancelled;
                    execution.completed_at = Some(nebula_core::Timestamp::now());
                    true
                }
                _ => false,
            }
        };
        if !committed {
            return;
        }
        tracing::info!(%execution_id, "task cancelled");
        self.publish_lifecycle("task.cancelled", &self.snapshot(execution_id))
            .await;
    }

    async fn publish_lifecycle(&self, event_type: &str, execution: &TaskExecution) {
        let payload = json!({
            "taskExecutionId": execution.id.to_string(),
            "taskType": execution.task_type,
            "execution": execution,
        });
        if let Err(err) = self.bus.publish(DomainEvent::new(event_type, payload)).await {
            tracing::warn!(event_type, error = %err, "lifecycle event publish failed");
        }
    }
}
