//! The runtime's main error type.

use std::fmt;

use thiserror::Error;

use crate::kind::RuntimeErrorKind;

/// Main error type returned by every runtime component.
///
/// Carries at minimum `{kind, message}`; `source` and `detail` are populated
/// when available.
#[derive(Debug, Error)]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    detail: Option<String>,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl RuntimeError {
    /// Construct a new error of the given kind.
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            detail: None,
        }
    }

    /// Attach a source error.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach structured detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The error's kind.
    #[must_use]
    pub const fn kind(&self) -> RuntimeErrorKind {
        self.kind
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// `NotFound` constructor.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        let entity = entity.into();
        Self::new(
            RuntimeErrorKind::NotFound,
            format!("{entity} '{id}' not found"),
        )
    }

    /// `AlreadyRegistered` constructor.
    pub fn already_registered(entity: impl Into<String>, key: impl fmt::Display) -> Self {
        let entity = entity.into();
        Self::new(
            RuntimeErrorKind::AlreadyRegistered,
            format!("{entity} '{key}' already registered"),
        )
    }

    /// `InvalidDefinition` constructor.
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::InvalidDefinition, message)
    }

    /// `DependencyUnsatisfied` constructor.
    pub fn dependency_unsatisfied(dep_id: impl fmt::Display) -> Self {
        Self::new(
            RuntimeErrorKind::DependencyUnsatisfied,
            format!("dependency '{dep_id}' is absent or not completed"),
        )
    }

    /// `NoTransition` constructor.
    pub fn no_transition(from: impl fmt::Display, event: impl fmt::Display) -> Self {
        Self::new(
            RuntimeErrorKind::NoTransition,
            format!("no transition from '{from}' on event '{event}'"),
        )
    }

    /// `GuardRejected` constructor.
    pub fn guard_rejected(from: impl fmt::Display, event: impl fmt::Display) -> Self {
        Self::new(
            RuntimeErrorKind::GuardRejected,
            format!("guard rejected transition from '{from}' on event '{event}'"),
        )
    }

    /// `Cancelled` constructor.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(RuntimeErrorKind::Cancelled, "operation cancelled")
    }

    /// `Timeout` constructor.
    #[must_use]
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::new(
            RuntimeErrorKind::Timeout,
            format!("operation timed out after {duration:?}"),
        )
    }

    /// `HandlerFailure` constructor, retaining the handler's own message.
    pub fn handler_failure(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::HandlerFailure, message)
    }

    /// `HookFailure` constructor.
    pub fn hook_failure(point: impl fmt::Display, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            RuntimeErrorKind::HookFailure,
            format!("hook at '{point}' failed: {message}"),
        )
    }

    /// `PublishFailure` constructor.
    pub fn publish_failure(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::PublishFailure, message)
    }

    /// `InvalidTransition` constructor.
    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            RuntimeErrorKind::InvalidTransition,
            format!("invalid transition from '{from}' to '{to}'"),
        )
    }

    /// Returns `true` if this is a `Timeout` error.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, RuntimeErrorKind::Timeout)
    }

    /// Returns `true` if this is a `Cancelled` error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, RuntimeErrorKind::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = RuntimeError::not_found("task execution", "abc-123");
        assert_eq!(err.to_string(), "not_found: task execution 'abc-123' not found");
    }

    #[test]
    fn detail_appended_to_display() {
        let err = RuntimeError::invalid_definition("bad states").with_detail("states=[]");
        assert_eq!(
            err.to_string(),
            "invalid_definition: bad states (states=[])"
        );
    }

    #[test]
    fn timeout_is_flagged() {
        let err = RuntimeError::timeout(std::time::Duration::from_millis(50));
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancelled_is_flagged() {
        let err = RuntimeError::cancelled();
        assert!(err.is_cancelled());
    }

    #[test]
    fn source_is_retained() {
        let io_err = std::io::Error::other("disk full");
        let err = RuntimeError::handler_failure("write failed").with_source(io_err);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn kind_accessor() {
        let err = RuntimeError::already_registered("task type", "double");
        assert_eq!(err.kind(), RuntimeErrorKind::AlreadyRegistered);
    }
}
