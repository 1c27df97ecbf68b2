//! The closed taxonomy of error kinds the runtime can produce.

/// Discriminant for [`crate::RuntimeError`].
///
/// One variant per named kind, no catch-all beyond
/// [`RuntimeErrorKind::HandlerFailure`] (which itself retains the handler's
/// own error as its source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RuntimeErrorKind {
    /// No registered task/process/definition/execution/checkpoint.
    NotFound,
    /// Duplicate key in a registry.
    AlreadyRegistered,
    /// Malformed process/task definition.
    InvalidDefinition,
    /// A referenced task execution is absent or not completed.
    DependencyUnsatisfied,
    /// `applyEvent` has no matching transition for the current state.
    NoTransition,
    /// A transition's guard rejected the event.
    GuardRejected,
    /// Operation aborted via cancellation token.
    Cancelled,
    /// Handler exceeded its configured deadline.
    Timeout,
    /// The handler itself returned or raised an error.
    HandlerFailure,
    /// An extension hook returned a failure on a pre-hook, aborting the
    /// enclosing operation.
    HookFailure,
    /// Event bus publish failed; always recovered locally by the caller.
    PublishFailure,
    /// A state transition was attempted that is not valid from the current
    /// state (used for task/process state-machine guards that are not one
    /// of the named kinds above).
    InvalidTransition,
}

impl RuntimeErrorKind {
    /// Stable, lower-snake-case code for this kind (used in `RuntimeError::code`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::InvalidDefinition => "invalid_definition",
            Self::DependencyUnsatisfied => "dependency_unsatisfied",
            Self::NoTransition => "no_transition",
            Self::GuardRejected => "guard_rejected",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
            Self::HandlerFailure => "handler_failure",
            Self::HookFailure => "hook_failure",
            Self::PublishFailure => "publish_failure",
            Self::InvalidTransition => "invalid_transition",
        }
    }
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RuntimeErrorKind::NotFound.code(), "not_found");
        assert_eq!(RuntimeErrorKind::Timeout.code(), "timeout");
        assert_eq!(RuntimeErrorKind::HookFailure.code(), "hook_failure");
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(RuntimeErrorKind::Cancelled.to_string(), "cancelled");
    }
}
