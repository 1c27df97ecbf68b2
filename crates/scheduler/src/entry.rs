//! The snapshot view of a pending schedule.

use nebula_core::{ScheduleId, Timestamp};

/// Public, clonable snapshot of a scheduled entry, as returned by
/// `getScheduledTasks()`: `{id, taskType, scheduledTime}`. The live
/// `pendingTimer` handle is never exposed outside the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// The schedule's id.
    pub id: ScheduleId,
    /// The task type that will be dispatched on fire.
    pub task_type: String,
    /// The wall-clock time the dispatch is armed for.
    pub scheduled_time: Timestamp,
}
