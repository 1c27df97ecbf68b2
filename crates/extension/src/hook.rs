//! Hook trait and the outcome of running one.

use async_trait::async_trait;
use serde_json::Value;

use nebula_error::Result;

/// The JSON-shaped params threaded through a chain of hooks.
///
/// A generic payload (same choice as [`nebula_eventbus::DomainEvent::payload`]
/// would be, were this crate to depend on it) rather than a point-specific
/// struct, since each [`crate::ExtensionPoint`] has its own ad hoc shape.
pub type HookParams = Value;

/// What a hook decided after observing (and possibly rewriting) `params`.
#[derive(Debug, Clone)]
pub enum HookOutcome {
    /// Continue the chain with (possibly modified) params.
    Continue(HookParams),
    /// Short-circuit immediately with a result, skipping remaining hooks and
    /// the operation they guard.
    ///
    /// Only meaningful at `TASK_BEFORE_EXECUTION`, where a
    /// `{skipExecution: true, result}` sentinel short-circuits the executor;
    /// hooks at other points that return `Skip` are treated by the executor
    /// as a plain `Continue` with `result` ignored.
    Skip {
        /// The value the guarded operation should return instead of running.
        result: Value,
    },
}

/// A single registered extension hook.
#[async_trait]
pub trait Hook: Send + Sync + 'static {
    /// Run against the current chain params, returning the next state of the
    /// chain or a hard failure that aborts the whole invocation.
    async fn call(&self, params: HookParams) -> Result<HookOutcome>;
}

#[async_trait]
impl<F> Hook for F
where
    F: Fn(HookParams) -> Result<HookOutcome> + Send + Sync + 'static,
{
    async fn call(&self, params: HookParams) -> Result<HookOutcome> {
        (self)(params)
    }
}
