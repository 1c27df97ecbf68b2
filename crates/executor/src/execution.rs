//! The execution record and its error payload.

use nebula_core::{Metadata, TaskExecutionId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::TaskStatus;

/// The error code surfaced when an attempt's timeout fires.
pub const TIMEOUT_CODE: &str = "TIMEOUT";

/// A failed attempt's error payload: `{kind, message, stack?, code?,
/// details}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    /// The error kind/category, used against `retryableErrorKinds`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Optional machine-readable code (`"TIMEOUT"` for timeouts).
    pub code: Option<String>,
    /// Optional structured detail.
    pub details: Option<Value>,
}

impl TaskError {
    /// Construct a plain handler-failure error.
    #[must_use]
    pub fn handler_failure(message: impl Into<String>) -> Self {
        Self {
            kind: "HandlerFailure".to_string(),
            message: message.into(),
            code: None,
            details: None,
        }
    }

    /// Construct the synthetic timeout error installed when an attempt's
    /// deadline fires.
    #[must_use]
    pub fn timeout() -> Self {
        Self {
            kind: "Timeout".to_string(),
            message: "task attempt exceeded its configured timeout".to_string(),
            code: Some(TIMEOUT_CODE.to_string()),
            details: None,
        }
    }

    /// Whether this error's kind or code matches `retryableErrorKinds` code
    /// `code`.
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.kind == code || self.code.as_deref() == Some(code) || self.message == code
    }

    /// Whether this error represents a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.code.as_deref() == Some(TIMEOUT_CODE)
    }
}

/// A single run of a registered task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    /// Unique execution id.
    pub id: TaskExecutionId,
    /// The task type this is an execution of.
    pub task_type: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// The input this execution was started with.
    pub input: Value,
    /// The handler's result, once `status == completed`.
    pub result: Option<Value>,
    /// The terminal error, once `status == failed`.
    pub error: Option<TaskError>,
    /// When the execution was created.
    pub created_at: Timestamp,
    /// When the first attempt started running.
    pub started_at: Option<Timestamp>,
    /// When the execution reached a terminal status.
    pub completed_at: Option<Timestamp>,
    /// 1-based counter of the current or most recent attempt.
    pub attempt_number: u32,
    /// Ids of executions this one declared a dependency on.
    pub depends_on: Option<Vec<TaskExecutionId>>,
    /// Free-form execution metadata.
    pub metadata: Metadata,
}

impl TaskExecution {
    /// Construct a fresh, `pending` execution record.
    #[must_use]
    pub fn new(task_type: impl Into<String>, input: Value) -> Self {
        Self {
            id: TaskExecutionId::v4(),
            task_type: task_type.into(),
            status: TaskStatus::Pending,
            input,
            result: None,
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            attempt_number: 1,
            depends_on: None,
            metadata: Metadata::new(),
        }
    }

    /// Attach the dependency ids this execution was started with.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: Vec<TaskExecutionId>) -> Self {
        self.depends_on = Some(depends_on);
        self
    }
}
