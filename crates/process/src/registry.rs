//! Indexed, versioned process definition registry.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use nebula_error::{Result, RuntimeError};
use semver::Version;

use crate::definition::{ProcessData, ProcessDefinition, ProcessState};

/// Maps process type (and, within a type, version) to [`ProcessDefinition`].
///
/// Indexed by `type -> (version -> definition)` so "highest registered
/// version" resolution is a `BTreeMap::last_key_value` lookup rather than a
/// linear scan.
pub struct ProcessRegistry<S, D> {
    definitions: HashMap<String, BTreeMap<Version, Arc<ProcessDefinition<S, D>>>>,
}

impl<S: ProcessState, D: ProcessData> ProcessRegistry<S, D> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Register `definition`. Validates it first, returning
    /// `InvalidDefinition` on a malformed definition, then fails with
    /// `AlreadyRegistered` on a duplicate `(type, version)`.
    pub fn register(&mut self, definition: ProcessDefinition<S, D>) -> Result<()> {
        definition.validate()?;

        let versions = self.definitions.entry(definition.process_type.clone()).or_default();
        if versions.contains_key(&definition.version) {
            return Err(RuntimeError::already_registered(
                "process definition",
                format!("{}@{}", definition.process_type, definition.version),
            ));
        }
        versions.insert(definition.version.clone(), Arc::new(definition));
        Ok(())
    }

    /// Unregister a specific `(type, version)`. Fails with `NotFound` if
    /// absent.
    pub fn unregister(&mut self, process_type: &str, version: &Version) -> Result<()> {
        let Some(versions) = self.definitions.get_mut(process_type) else {
            return Err(RuntimeError::not_found("process definition", process_type));
        };
        if versions.remove(version).is_none() {
            return Err(RuntimeError::not_found(
                "process definition",
                format!("{process_type}@{version}"),
            ));
        }
        if versions.is_empty() {
            self.definitions.remove(process_type);
        }
        Ok(())
    }

    /// Exact `(type, version)` lookup.
    pub fn get(&self, process_type: &str, version: &Version) -> Result<Arc<ProcessDefinition<S, D>>> {
        self.definitions
            .get(process_type)
            .and_then(|versions| versions.get(version))
            .cloned()
            .ok_or_else(|| {
                RuntimeError::not_found("process definition", format!("{process_type}@{version}"))
            })
    }

    /// Look up by type, resolving to `version` exactly if given, else the
    /// highest registered version.
    pub fn get_by_type(
        &self,
        process_type: &str,
        version: Option<&Version>,
    ) -> Result<Arc<ProcessDefinition<S, D>>> {
        match version {
            Some(version) => self.get(process_type, version),
            None => self
                .definitions
                .get(process_type)
                .and_then(|versions| versions.last_key_value())
                .map(|(_, definition)| definition.clone())
                .ok_or_else(|| RuntimeError::not_found("process definition", process_type)),
        }
    }

    /// Every registered definition, across all types and versions.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<ProcessDefinition<S, D>>> {
        self.definitions
            .values()
            .flat_map(|versions| versions.values().cloned())
            .collect()
    }
}

impl<S: ProcessState, D: ProcessData> Default for ProcessRegistry<S, D> {
    fn default() -> Self {
        Self::new()
    }
}
