//! The process manager: create, transition, checkpoint, restore.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_core::{CheckpointId, Metadata, ProcessId, Timestamp};
use nebula_error::{Result, RuntimeError};
use nebula_eventbus::{DomainEvent, EventBus};
use nebula_extension::{ExtensionPoint, ExtensionRegistry, HookOutcome};
use parking_lot::RwLock;
use semver::Version;
use serde_json::{json, Value};

use crate::checkpoint::ProcessCheckpoint;
use crate::definition::{ProcessData, ProcessState};
use crate::instance::{ProcessInstance, RecoveryInfo};
use crate::registry::ProcessRegistry;

/// Drives process instance lifecycle against a shared [`ProcessRegistry`].
///
/// Exclusively owns the process and checkpoint stores.
pub struct ProcessManager<S, D> {
    registry: Arc<RwLock<ProcessRegistry<S, D>>>,
    bus: Arc<EventBus>,
    extensions: Arc<ExtensionRegistry>,
    instances: RwLock<HashMap<ProcessId, ProcessInstance<S, D>>>,
    checkpoints: RwLock<HashMap<CheckpointId, ProcessCheckpoint<S, D>>>,
}

impl<S: ProcessState, D: ProcessData> ProcessManager<S, D> {
    /// Construct a manager sharing the given process registry, event bus,
    /// and extension registry.
    #[must_use]
    pub fn new(
        registry: Arc<RwLock<ProcessRegistry<S, D>>>,
        bus: Arc<EventBus>,
        extensions: Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            registry,
            bus,
            extensions,
            instances: RwLock::new(HashMap::new()),
            checkpoints: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new instance of `process_type`.
    ///
    /// Runs `PROCESS_BEFORE_CREATE` before the instance exists (a pre-hook
    /// failure aborts creation, the same general hook-failure rule every
    /// extension point follows); then runs the initial state's entry
    /// action, whose failure is logged but does not abort creation — the
    /// instance still ends up in `initialState` with its original data.
    pub async fn create_process(
        &self,
        process_type: &str,
        data: D,
        version: Option<&Version>,
    ) -> Result<ProcessInstance<S, D>> {
        let definition = self.registry.read().get_by_type(process_type, version)?;

        let data_value = serde_json::to_value(&data)
            .map_err(|err| RuntimeError::invalid_definition(err.to_string()))?;
        let before_params = json!({
            "processType": process_type,
            "version": definition.version.to_string(),
            "data": data_value,
        });
        let data = match self
            .extensions
            .execute(ExtensionPoint::ProcessBeforeCreate, before_params)
            .await?
        {
            HookOutcome::Continue(params) => match params.get("data") {
                Some(value) => serde_json::from_value(value.clone()).unwrap_or(data),
                None => data,
            },
            HookOutcome::Skip { .. } => data,
        };

        let mut instance = ProcessInstance::new(
            process_type,
            definition.version.clone(),
            definition.initial_state.clone(),
            data,
        );

        match definition.run_entry_action(&instance.state, instance.data.clone()) {
            Ok(data) => instance.data = data,
            Err(err) => {
                tracing::warn!(process_type, error = %err, "initial-state entry action failed");
            }
        }
        instance.updated_at = Timestamp::now();

        self.instances.write().insert(instance.id, instance.clone());
        self.publish("process.created", &instance).await;
        Ok(instance)
    }

    /// Snapshot of a live instance.
    pub fn get_process(&self, id: ProcessId) -> Result<ProcessInstance<S, D>> {
        self.instances
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| RuntimeError::not_found("process instance", id))
    }

    /// Apply `event_name` to instance `id`.
    pub async fn apply_event(
        &self,
        id: ProcessId,
        event_name: &str,
        payload: Value,
    ) -> Result<ProcessInstance<S, D>> {
        let mut instance = self.get_process(id)?;
        let definition = self
            .registry
            .read()
            .get(&instance.process_type, &instance.version)?;

        let transition = definition
            .find_transition(&instance.state, event_name)
            .ok_or_else(|| RuntimeError::no_transition(format!("{:?}", instance.state), event_name))?;

        if let Some(guard) = &transition.guard {
            if !guard(&instance.data, &payload) {
                return Err(RuntimeError::guard_rejected(
                    format!("{:?}", instance.state),
                    event_name,
                ));
            }
        }

        let from = instance.state.clone();
        let to = transition.to.clone();

        match definition.run_exit_action(&from, instance.data.clone()) {
            Ok(data) => instance.data = data,
            Err(err) => tracing::warn!(%id, error = %err, "exit action failed"),
        }

        instance.state = to.clone();
        instance.stamp_last_transition(&from, &to, event_name);

        match definition.run_entry_action(&to, instance.data.clone()) {
            Ok(data) => instance.data = data,
            Err(err) => tracing::warn!(%id, error = %err, "entry action failed"),
        }
        instance.updated_at = Timestamp::now();

        self.instances.write().insert(id, instance.clone());

        let after_params = json!({
            "processId": id.to_string(),
            "from": format!("{from:?}"),
            "to": format!("{to:?}"),
            "event": event_name,
        });
        if let Err(err) = self
            .extensions
            .execute(ExtensionPoint::ProcessAfterTransition, after_params)
            .await
        {
            tracing::warn!(%id, error = %err, "PROCESS_AFTER_TRANSITION hook failed");
        }
        self.publish("process.transitioned", &instance).await;

        Ok(instance)
    }

    /// Deep-snapshot instance `id`'s state and data.
    pub fn save_checkpoint(&self, id: ProcessId) -> Result<ProcessCheckpoint<S, D>> {
        let mut instances = self.instances.write();
        let instance = instances
            .get_mut(&id)
            .ok_or_else(|| RuntimeError::not_found("process instance", id))?;

        let checkpoint = ProcessCheckpoint::new(
            id,
            instance.state.clone(),
            instance.data.clone(),
            instance.process_type.clone(),
            instance.version.clone(),
        );
        instance.stamp_latest_checkpoint(checkpoint.id);
        instance.updated_at = Timestamp::now();
        drop(instances);

        self.checkpoints.write().insert(checkpoint.id, checkpoint.clone());
        Ok(checkpoint)
    }

    /// Rehydrate instance `id` from a previously saved checkpoint.
    pub fn restore_from_checkpoint(
        &self,
        id: ProcessId,
        checkpoint_id: CheckpointId,
    ) -> Result<ProcessInstance<S, D>> {
        let checkpoint = self
            .checkpoints
            .read()
            .get(&checkpoint_id)
            .cloned()
            .ok_or_else(|| RuntimeError::not_found("checkpoint", checkpoint_id))?;

        let created_at = self
            .instances
            .read()
            .get(&id)
            .map_or(checkpoint.created_at, |existing| existing.created_at);

        let mut instance = ProcessInstance {
            id,
            process_type: checkpoint.metadata.process_type.clone(),
            version: checkpoint.metadata.version.clone(),
            state: checkpoint.state.clone(),
            data: checkpoint.data.clone(),
            created_at,
            updated_at: Timestamp::now(),
            metadata: Metadata::new(),
            recovery: Some(RecoveryInfo {
                checkpoint_id,
                last_saved_at: checkpoint.created_at,
            }),
        };
        instance.stamp_restored(checkpoint_id);

        self.instances.write().insert(id, instance.clone());
        Ok(instance)
    }

    async fn publish(&self, event_type: &str, instance: &ProcessInstance<S, D>)
    where
        S: serde::Serialize,
        D: serde::Serialize,
    {
        let Ok(payload) = serde_json::to_value(instance) else {
            tracing::warn!(event_type, "failed to serialize process instance for publish");
            return;
        };
        let event = DomainEvent::new(
            event_type,
            json!({
                "processId": instance.id.to_string(),
                "processType": instance.process_type,
                "instance": payload,
            }),
        );
        if let Err(err) = self.bus.publish(event).await {
            tracing::warn!(event_type, error = %err, "process lifecycle event publish failed");
        }
    }
}
