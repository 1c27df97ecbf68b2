//! Transition legality for [`TaskStatus`].

use nebula_error::{Result, RuntimeError};

use crate::status::TaskStatus;

/// Returns `true` if moving from `from` to `to` is a legal transition.
///
/// The executor's own retry loop never attempts an illegal transition, but
/// the predicate is exposed for process-manager consumers reading
/// `TaskExecution` snapshots and for transition-table tests, mirroring the
/// teacher's `can_transition_execution`.
#[must_use]
pub fn can_transition_task(from: TaskStatus, to: TaskStatus) -> bool {
    matches!(
        (from, to),
        (TaskStatus::Pending, TaskStatus::Running)
            | (TaskStatus::Pending, TaskStatus::Cancelled)
            | (TaskStatus::Running, TaskStatus::Completed)
            | (TaskStatus::Running, TaskStatus::Failed)
            | (TaskStatus::Running, TaskStatus::Cancelled)
            | (TaskStatus::Failed, TaskStatus::Running)
    )
}

/// Validate a transition, returning [`RuntimeError::invalid_transition`] if
/// illegal.
pub fn validate_task_transition(from: TaskStatus, to: TaskStatus) -> Result<()> {
    if can_transition_task(from, to) {
        Ok(())
    } else {
        Err(RuntimeError::invalid_transition(from, to))
    }
}
