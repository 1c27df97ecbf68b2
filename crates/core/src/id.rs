//! Unique identifiers for runtime entities.
//!
//! Every runtime entity gets its own [`domain_key::define_uuid!`]-generated
//! wrapper type around an opaque, centrally-generated unique id. Each type
//! is `Copy` (16 bytes), supports `v4()`/`parse`, and
//! carries full serde support — but distinct entity ids are distinct Rust
//! types, so an `EventId` can never be passed where a `TaskExecutionId` is
//! expected.

use domain_key::define_uuid;

// Re-export for downstream parse-error handling.
pub use domain_key::UuidParseError;

define_uuid!(EventIdDomain => EventId);
define_uuid!(TaskExecutionIdDomain => TaskExecutionId);
define_uuid!(ScheduleIdDomain => ScheduleId);
define_uuid!(ProcessIdDomain => ProcessId);
define_uuid!(CheckpointIdDomain => CheckpointId);
define_uuid!(HookIdDomain => HookId);
define_uuid!(SubscriptionIdDomain => SubscriptionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_is_not_nil() {
        assert!(!EventId::v4().is_nil());
        assert!(!TaskExecutionId::v4().is_nil());
    }

    #[test]
    fn distinct_types_do_not_compare() {
        // Compile-time guarantee: this test exists to document that the
        // following would not compile if uncommented.
        // fn accepts_event(_id: EventId) {}
        // accepts_event(TaskExecutionId::v4());
        let event = EventId::v4();
        let task = TaskExecutionId::v4();
        assert_ne!(event.to_string(), task.to_string());
    }

    #[test]
    fn parse_roundtrip() {
        let id = ProcessId::v4();
        let parsed = ProcessId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_roundtrip() {
        let id = CheckpointId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: CheckpointId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
