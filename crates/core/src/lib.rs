#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Core
//!
//! Core identifiers and value types shared across every Nebula Flow runtime
//! crate: typed entity ids, the [`Timestamp`] used for lifecycle fields, and
//! the opaque [`Metadata`] map attached to events, executions, and process
//! instances.

pub mod id;
pub mod metadata;
pub mod timestamp;

pub use id::{
    CheckpointId, EventId, HookId, ProcessId, ScheduleId, SubscriptionId, TaskExecutionId,
    UuidParseError,
};
pub use metadata::{Metadata, CORRELATION_ID_KEY};
pub use timestamp::Timestamp;
