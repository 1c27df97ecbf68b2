//! On-demand runtime metrics snapshot.

use std::collections::HashMap;

use nebula_executor::TaskStatus;

/// A point-in-time snapshot of executor/scheduler counts: tasks by status,
/// running count, scheduled count.
///
/// Computed fresh on each [`crate::Runtime::metrics`] call from the
/// executor's and scheduler's own in-memory state — nothing is tracked here
/// independently, so there is nothing to keep in sync.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RuntimeMetrics {
    /// Known task executions grouped by their current status.
    pub tasks_by_status: HashMap<TaskStatus, u64>,
    /// Executions currently running an attempt.
    pub running_count: usize,
    /// Schedules still pending dispatch.
    pub scheduled_count: usize,
}
