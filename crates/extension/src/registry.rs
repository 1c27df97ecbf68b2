//! Priority-ordered registry of hooks per extension point.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_core::HookId;
use nebula_error::{Result, RuntimeError};

use crate::hook::{Hook, HookOutcome, HookParams};
use crate::point::ExtensionPoint;

struct Registration {
    id: HookId,
    priority: i32,
    hook: Arc<dyn Hook>,
}

/// Registers hooks against [`ExtensionPoint`]s and executes them in
/// descending-priority, then-registration order.
///
/// An id-keyed registration map, generalized to one priority chain per
/// extension point rather than a single flat list.
#[derive(Default)]
pub struct ExtensionRegistry {
    chains: HashMap<ExtensionPoint, Vec<Registration>>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// Register `hook` against `point` with the given `priority`. Higher
    /// priority runs first; ties keep registration order (stable sort).
    pub fn register(
        &mut self,
        point: ExtensionPoint,
        priority: i32,
        hook: Arc<dyn Hook>,
    ) -> HookId {
        let id = HookId::v4();
        let chain = self.chains.entry(point).or_default();
        chain.push(Registration { id, priority, hook });
        chain.sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    /// Remove a previously registered hook. Fails with `NotFound` if `id`
    /// is not registered at any point.
    pub fn unregister(&mut self, id: HookId) -> Result<()> {
        for chain in self.chains.values_mut() {
            if let Some(pos) = chain.iter().position(|reg| reg.id == id) {
                chain.remove(pos);
                return Ok(());
            }
        }
        Err(RuntimeError::not_found("hook", id))
    }

    /// Number of hooks registered at `point`.
    #[must_use]
    pub fn len(&self, point: ExtensionPoint) -> usize {
        self.chains.get(&point).map_or(0, Vec::len)
    }

    /// Whether any hook is registered at `point`.
    #[must_use]
    pub fn is_empty(&self, point: ExtensionPoint) -> bool {
        self.len(point) == 0
    }

    /// Thread `params` through every hook registered at `point`, in priority
    /// order: each hook receives the current params and returns the next
    /// state of the chain; on `Err` iteration stops and the failure bubbles;
    /// `HookOutcome::Skip` short-circuits immediately.
    pub async fn execute(
        &self,
        point: ExtensionPoint,
        initial: HookParams,
    ) -> Result<HookOutcome> {
        let Some(chain) = self.chains.get(&point) else {
            return Ok(HookOutcome::Continue(initial));
        };

        let mut params = initial;
        for registration in chain {
            match registration.hook.call(params).await {
                Ok(HookOutcome::Continue(next)) => params = next,
                Ok(skip @ HookOutcome::Skip { .. }) => return Ok(skip),
                Err(err) => {
                    tracing::warn!(point = %point, error = %err, "extension hook failed");
                    return Err(RuntimeError::hook_failure(point, err.to_string()));
                }
            }
        }
        Ok(HookOutcome::Continue(params))
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field(
                "points",
                &self
                    .chains
                    .iter()
                    .map(|(point, chain)| (*point, chain.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hook(f: impl Fn(HookParams) -> Result<HookOutcome> + Send + Sync + 'static) -> Arc<dyn Hook> {
        Arc::new(f)
    }

    #[tokio::test]
    async fn empty_chain_passes_params_through() {
        let registry = ExtensionRegistry::new();
        let outcome = registry
            .execute(ExtensionPoint::EventBeforePublish, json!({"a": 1}))
            .await
            .unwrap();
        match outcome {
            HookOutcome::Continue(params) => assert_eq!(params, json!({"a": 1})),
            HookOutcome::Skip { .. } => panic!("expected continue"),
        }
    }

    #[tokio::test]
    async fn hooks_run_in_priority_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(
            ExtensionPoint::EventBeforePublish,
            0,
            hook(|mut params| {
                params["order"].as_array_mut().unwrap().push(json!("low"));
                Ok(HookOutcome::Continue(params))
            }),
        );
        registry.register(
            ExtensionPoint::EventBeforePublish,
            10,
            hook(|mut params| {
                params["order"].as_array_mut().unwrap().push(json!("high"));
                Ok(HookOutcome::Continue(params))
            }),
        );

        let outcome = registry
            .execute(ExtensionPoint::EventBeforePublish, json!({"order": []}))
            .await
            .unwrap();
        let HookOutcome::Continue(params) = outcome else {
            panic!("expected continue");
        };
        assert_eq!(params["order"], json!(["high", "low"]));
    }

    #[tokio::test]
    async fn skip_short_circuits() {
        let mut registry = ExtensionRegistry::new();
        registry.register(
            ExtensionPoint::TaskBeforeExecution,
            10,
            hook(|_params| {
                Ok(HookOutcome::Skip {
                    result: json!("cached"),
                })
            }),
        );
        registry.register(
            ExtensionPoint::TaskBeforeExecution,
            0,
            hook(|_params| panic!("should not run after skip")),
        );

        let outcome = registry
            .execute(ExtensionPoint::TaskBeforeExecution, json!({}))
            .await
            .unwrap();
        match outcome {
            HookOutcome::Skip { result } => assert_eq!(result, json!("cached")),
            HookOutcome::Continue(_) => panic!("expected skip"),
        }
    }

    #[tokio::test]
    async fn failure_bubbles_and_stops_chain() {
        let mut registry = ExtensionRegistry::new();
        registry.register(
            ExtensionPoint::EventAfterPublish,
            10,
            hook(|_params| Err(RuntimeError::handler_failure("boom"))),
        );
        let err = registry
            .execute(ExtensionPoint::EventAfterPublish, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), nebula_error::RuntimeErrorKind::HookFailure));
    }

    #[test]
    fn unregister_missing_is_not_found() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.unregister(HookId::v4()).is_err());
    }
}
