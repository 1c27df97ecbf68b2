//! Runtime lifecycle state and health reporting.

use std::fmt;

/// The runtime's own lifecycle: `initializing → initialized → running →
/// stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    /// Constructed but `init()` has not yet run.
    Initializing,
    /// Components wired and validated; not yet accepting work.
    Initialized,
    /// Accepting work.
    Running,
    /// `stop()` has run; the runtime should not be reused.
    Stopped,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Initialized => write!(f, "initialized"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// The runtime's reported health, as returned by `get_health()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// `Running`, and no component has reported a failure.
    Healthy,
    /// Not yet `Running`, or cleanly `Stopped`.
    Degraded,
    /// A component reported a failure (see
    /// [`crate::Runtime::mark_unhealthy`]).
    Unhealthy,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}
