//! The context handed to a task handler on each attempt.

use nebula_core::Metadata;
use nebula_error::{Result, RuntimeError};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Everything a handler needs for one attempt: `{input, attemptNumber,
/// previousError?, cancellationToken, metadata, state, previousResults?}`.
///
/// Identity/attempt fields plus a `CancellationToken` the handler is
/// expected to poll cooperatively via [`Self::check_cancelled`].
#[non_exhaustive]
pub struct TaskContext {
    /// The task's input payload.
    pub input: Value,
    /// 1-based attempt counter for this execution.
    pub attempt_number: u32,
    /// The error from the previous attempt, if any.
    pub previous_error: Option<String>,
    /// Cancellation signal shared with the owning execution.
    pub cancellation: CancellationToken,
    /// Execution-scoped metadata.
    pub metadata: Metadata,
    /// Results of dependency executions, keyed by dependency id, when this
    /// task was started via `executeTaskWithDependencies`.
    pub previous_results: Option<Value>,
}

impl TaskContext {
    /// Construct a context for the first attempt.
    #[must_use]
    pub fn new(input: Value, cancellation: CancellationToken) -> Self {
        Self {
            input,
            attempt_number: 1,
            previous_error: None,
            cancellation,
            metadata: Metadata::new(),
            previous_results: None,
        }
    }

    /// Check whether cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::cancelled`] if the token has fired.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(RuntimeError::cancelled())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_starts_at_attempt_one() {
        let ctx = TaskContext::new(Value::Null, CancellationToken::new());
        assert_eq!(ctx.attempt_number, 1);
        assert!(ctx.check_cancelled().is_ok());
    }

    #[test]
    fn cancelled_token_surfaces_as_error() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = TaskContext::new(Value::Null, token);
        assert!(ctx.check_cancelled().unwrap_err().is_cancelled());
    }
}
