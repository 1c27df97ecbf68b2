//! In-memory registry mapping task type to [`TaskDefinition`].

use std::collections::HashMap;
use std::sync::Arc;

use nebula_error::{Result, RuntimeError};

use crate::definition::TaskDefinition;

/// Register/unregister/lookup of [`TaskDefinition`]s by unique task type.
#[derive(Default)]
pub struct TaskRegistry {
    definitions: HashMap<String, Arc<TaskDefinition>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition`. Fails with `AlreadyRegistered` on a duplicate
    /// task type.
    pub fn register(&mut self, definition: TaskDefinition) -> Result<()> {
        if self.definitions.contains_key(&definition.task_type) {
            return Err(RuntimeError::already_registered(
                "task definition",
                &definition.task_type,
            ));
        }
        self.definitions
            .insert(definition.task_type.clone(), Arc::new(definition));
        Ok(())
    }

    /// Unregister a task type. Fails with `NotFound` if it is not
    /// registered.
    pub fn unregister(&mut self, task_type: &str) -> Result<()> {
        self.definitions
            .remove(task_type)
            .map(|_| ())
            .ok_or_else(|| RuntimeError::not_found("task definition", task_type))
    }

    /// Look up a definition by task type.
    pub fn get(&self, task_type: &str) -> Result<Arc<TaskDefinition>> {
        self.definitions
            .get(task_type)
            .cloned()
            .ok_or_else(|| RuntimeError::not_found("task definition", task_type))
    }

    /// Whether `task_type` is registered.
    #[must_use]
    pub fn has(&self, task_type: &str) -> bool {
        self.definitions.contains_key(task_type)
    }

    /// All registered definitions matching `predicate`.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Vec<Arc<TaskDefinition>>
    where
        F: Fn(&TaskDefinition) -> bool,
    {
        self.definitions
            .values()
            .filter(|def| predicate(def))
            .cloned()
            .collect()
    }

    /// All registered definitions that declare `resource` among their
    /// required resources.
    #[must_use]
    pub fn filter_by_resource(&self, resource: &str) -> Vec<Arc<TaskDefinition>> {
        self.filter(|def| def.requires_resource(resource))
    }

    /// All registered task types.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<TaskDefinition>> {
        self.definitions.values().cloned().collect()
    }
}
