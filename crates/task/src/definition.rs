//! Registered task type definitions.

use std::sync::Arc;
use std::time::Duration;

use nebula_core::Metadata;

use crate::handler::TaskHandler;
use crate::retry::RetryPolicy;

/// A registered task type: its handler plus the policies governing it.
pub struct TaskDefinition {
    /// Unique registry key.
    pub task_type: String,
    /// The handler invoked on each attempt.
    pub handler: Arc<dyn TaskHandler>,
    /// Retry policy; `None` means a single attempt with no retry.
    pub retry_policy: Option<RetryPolicy>,
    /// Per-attempt deadline; `None` or zero means no timeout.
    pub timeout: Option<Duration>,
    /// Task types this one typically depends on (advisory; dependency
    /// resolution is driven by the caller's `dependencyIds`, not this list).
    pub dependencies: Option<Vec<String>>,
    /// Named resource tags this task declares it needs. The runtime does not
    /// interpret these beyond `TaskRegistry::filter_by_resource` — resource
    /// provisioning itself is out of scope for this crate.
    pub resources: Option<Vec<String>>,
    /// Free-form definition metadata.
    pub metadata: Metadata,
}

impl TaskDefinition {
    /// Construct a definition with no retry policy, timeout, dependencies,
    /// resources, or metadata.
    #[must_use]
    pub fn new(task_type: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            task_type: task_type.into(),
            handler,
            retry_policy: None,
            timeout: None,
            dependencies: None,
            resources: None,
            metadata: Metadata::new(),
        }
    }

    /// Attach a retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Attach a per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach required resource tags.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Whether this definition declares `resource` among its required
    /// resources.
    #[must_use]
    pub fn requires_resource(&self, resource: &str) -> bool {
        self.resources
            .as_ref()
            .is_some_and(|resources| resources.iter().any(|r| r == resource))
    }
}

impl std::fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("task_type", &self.task_type)
            .field("has_retry_policy", &self.retry_policy.is_some())
            .field("timeout", &self.timeout)
            .field("resources", &self.resources)
            .finish()
    }
}
