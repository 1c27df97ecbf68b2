//! The closed set of named extension points.

use std::fmt;
use std::str::FromStr;

/// A canonical site at which hooks may observe or modify a core operation.
///
/// A finite closed set keyed by name, modeled as an enum rather than a
/// string so registration against an unknown point is a compile error, not
/// a typo waiting to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ExtensionPoint {
    /// Before an event is delivered to subscribers.
    EventBeforePublish,
    /// After an event has been delivered to subscribers.
    EventAfterPublish,
    /// Before a task handler runs for an attempt.
    TaskBeforeExecution,
    /// After a task execution reaches a terminal success.
    TaskAfterCompletion,
    /// When a task attempt fails.
    TaskOnError,
    /// Before a process instance is created.
    ProcessBeforeCreate,
    /// After a process instance completes a state transition.
    ProcessAfterTransition,
}

impl ExtensionPoint {
    /// All canonical points, in fire-order within their lifecycle.
    pub const ALL: [ExtensionPoint; 7] = [
        Self::EventBeforePublish,
        Self::EventAfterPublish,
        Self::TaskBeforeExecution,
        Self::TaskAfterCompletion,
        Self::TaskOnError,
        Self::ProcessBeforeCreate,
        Self::ProcessAfterTransition,
    ];

    /// The canonical `SCREAMING_SNAKE_CASE` name, as used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EventBeforePublish => "EVENT_BEFORE_PUBLISH",
            Self::EventAfterPublish => "EVENT_AFTER_PUBLISH",
            Self::TaskBeforeExecution => "TASK_BEFORE_EXECUTION",
            Self::TaskAfterCompletion => "TASK_AFTER_COMPLETION",
            Self::TaskOnError => "TASK_ON_ERROR",
            Self::ProcessBeforeCreate => "PROCESS_BEFORE_CREATE",
            Self::ProcessAfterTransition => "PROCESS_AFTER_TRANSITION",
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown extension point name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown extension point: {0}")]
pub struct UnknownExtensionPoint(pub String);

impl FromStr for ExtensionPoint {
    type Err = UnknownExtensionPoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|point| point.name() == s)
            .ok_or_else(|| UnknownExtensionPoint(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for point in ExtensionPoint::ALL {
            let parsed: ExtensionPoint = point.to_string().parse().unwrap();
            assert_eq!(parsed, point);
        }
    }

    #[test]
    fn unknown_name_fails() {
        assert!("NOT_A_POINT".parse::<ExtensionPoint>().is_err());
    }
}
