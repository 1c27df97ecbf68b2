//! Versioned process (FSM) definitions.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use nebula_core::Metadata;
use nebula_error::{Result, RuntimeError};
use semver::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Bound satisfied by any type usable as a process's `State`.
///
/// States are compared for transition lookup, so `Eq + Hash`; checkpoints
/// serialize them for inspection, so `Serialize + DeserializeOwned`.
pub trait ProcessState:
    Clone + Eq + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> ProcessState for T where
    T: Clone + Eq + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

/// Bound satisfied by any type usable as a process's `Data`.
pub trait ProcessData: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> ProcessData for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// A synchronous entry/exit action run on a state transition: these mutate
/// `Data` and may fail, but unlike task handlers they are not expected to
/// suspend.
pub type StateAction<D> = Arc<dyn Fn(D) -> Result<D> + Send + Sync>;

/// A transition guard evaluated against the instance's current `Data` and
/// the event payload.
pub type TransitionGuard<D> = Arc<dyn Fn(&D, &Value) -> bool + Send + Sync>;

/// A single edge in the transition table, keyed by `(from, event)` — a
/// state has at most one outgoing transition per event name.
pub struct Transition<S, D> {
    /// Source state.
    pub from: S,
    /// Destination state.
    pub to: S,
    /// The event name that fires this transition.
    pub event: String,
    /// Optional guard; the transition only applies if it returns `true`.
    pub guard: Option<TransitionGuard<D>>,
}

impl<S, D> Transition<S, D> {
    /// Construct an unguarded transition.
    pub fn new(from: S, to: S, event: impl Into<String>) -> Self {
        Self {
            from,
            to,
            event: event.into(),
            guard: None,
        }
    }

    /// Attach a guard.
    #[must_use]
    pub fn with_guard(mut self, guard: TransitionGuard<D>) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// A registered, versioned finite-state-machine shape.
pub struct ProcessDefinition<S, D> {
    /// Unique registry key (paired with `version`).
    pub process_type: String,
    /// Semver version of this definition.
    pub version: Version,
    /// The state new instances start in.
    pub initial_state: S,
    /// Every valid state.
    pub states: Vec<S>,
    /// States considered terminal, if any are distinguished.
    pub final_states: Vec<S>,
    /// The transition table.
    pub transitions: Vec<Transition<S, D>>,
    /// Per-state action run on entering that state.
    pub entry_actions: Vec<(S, StateAction<D>)>,
    /// Per-state action run on leaving that state.
    pub exit_actions: Vec<(S, StateAction<D>)>,
    /// Free-form definition metadata.
    pub metadata: Metadata,
}

impl<S: ProcessState, D> ProcessDefinition<S, D> {
    /// Construct a definition with an empty transition table and no
    /// entry/exit actions.
    #[must_use]
    pub fn new(
        process_type: impl Into<String>,
        version: Version,
        initial_state: S,
        states: Vec<S>,
    ) -> Self {
        Self {
            process_type: process_type.into(),
            version,
            initial_state,
            states,
            final_states: Vec::new(),
            transitions: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Declare `states` as final, for `is_final` queries.
    #[must_use]
    pub fn with_final_states(mut self, states: Vec<S>) -> Self {
        self.final_states = states;
        self
    }

    /// Append a transition.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition<S, D>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Attach an entry action for `state`.
    #[must_use]
    pub fn with_entry_action(mut self, state: S, action: StateAction<D>) -> Self {
        self.entry_actions.push((state, action));
        self
    }

    /// Attach an exit action for `state`.
    #[must_use]
    pub fn with_exit_action(mut self, state: S, action: StateAction<D>) -> Self {
        self.exit_actions.push((state, action));
        self
    }

    /// `true` if `state` is one of the declared final states.
    #[must_use]
    pub fn is_final(&self, state: &S) -> bool {
        self.final_states.iter().any(|s| s == state)
    }

    /// Find the transition matching `(from, event)`, if any.
    #[must_use]
    pub fn find_transition(&self, from: &S, event: &str) -> Option<&Transition<S, D>> {
        self.transitions
            .iter()
            .find(|t| &t.from == from && t.event == event)
    }

    fn entry_action(&self, state: &S) -> Option<&StateAction<D>> {
        self.entry_actions
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, action)| action)
    }

    fn exit_action(&self, state: &S) -> Option<&StateAction<D>> {
        self.exit_actions
            .iter()
            .find(|(s, _)| s == state)
            .map(|(_, action)| action)
    }

    /// Run the entry action registered for `state`, if any.
    pub(crate) fn run_entry_action(&self, state: &S, data: D) -> Result<D> {
        match self.entry_action(state) {
            Some(action) => action(data),
            None => Ok(data),
        }
    }

    /// Run the exit action registered for `state`, if any.
    pub(crate) fn run_exit_action(&self, state: &S, data: D) -> Result<D> {
        match self.exit_action(state) {
            Some(action) => action(data),
            None => Ok(data),
        }
    }

    /// Validate the definition's internal consistency: `initialState` and
    /// every transition endpoint must lie within `states[]`; `(from, event)`
    /// pairs must be unique (deterministic transitions).
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::invalid_definition`] on any violation.
    pub fn validate(&self) -> Result<()> {
        if !self.states.contains(&self.initial_state) {
            return Err(RuntimeError::invalid_definition(format!(
                "initial state '{:?}' is not among the declared states",
                self.initial_state
            )));
        }

        for transition in &self.transitions {
            if !self.states.contains(&transition.from) {
                return Err(RuntimeError::invalid_definition(format!(
                    "transition source '{:?}' is not among the declared states",
                    transition.from
                )));
            }
            if !self.states.contains(&transition.to) {
                return Err(RuntimeError::invalid_definition(format!(
                    "transition target '{:?}' is not among the declared states",
                    transition.to
                )));
            }
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        for transition in &self.transitions {
            let key = (format!("{:?}", transition.from), transition.event.clone());
            if !seen.insert(key) {
                return Err(RuntimeError::invalid_definition(format!(
                    "duplicate transition for event '{}' from state '{:?}'",
                    transition.event, transition.from
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    enum OrderState {
        Created,
        Approved,
        Fulfilled,
    }

    fn def() -> ProcessDefinition<OrderState, Value> {
        ProcessDefinition::new(
            "order",
            Version::new(1, 0, 0),
            OrderState::Created,
            vec![OrderState::Created, OrderState::Approved, OrderState::Fulfilled],
        )
        .with_transition(Transition::new(OrderState::Created, OrderState::Approved, "approve"))
        .with_transition(Transition::new(OrderState::Approved, OrderState::Fulfilled, "fulfill"))
    }

    #[test]
    fn valid_definition_passes() {
        assert!(def().validate().is_ok());
    }

    #[test]
    fn initial_state_must_be_declared() {
        let bad = ProcessDefinition::<OrderState, Value>::new(
            "order",
            Version::new(1, 0, 0),
            OrderState::Fulfilled,
            vec![OrderState::Created],
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn transition_endpoints_must_be_declared() {
        let bad = ProcessDefinition::<OrderState, Value>::new(
            "order",
            Version::new(1, 0, 0),
            OrderState::Created,
            vec![OrderState::Created],
        )
        .with_transition(Transition::new(OrderState::Created, OrderState::Approved, "approve"));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn duplicate_from_event_pair_rejected() {
        let bad = def().with_transition(Transition::new(
            OrderState::Created,
            OrderState::Fulfilled,
            "approve",
        ));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn find_transition_matches_from_and_event() {
        let definition = def();
        let found = definition.find_transition(&OrderState::Created, "approve").unwrap();
        assert_eq!(found.to, OrderState::Approved);
        assert!(definition.find_transition(&OrderState::Created, "fulfill").is_none());
    }

    #[test]
    fn is_final_checks_declared_final_states() {
        let definition = def().with_final_states(vec![OrderState::Fulfilled]);
        assert!(definition.is_final(&OrderState::Fulfilled));
        assert!(!definition.is_final(&OrderState::Created));
    }
}
