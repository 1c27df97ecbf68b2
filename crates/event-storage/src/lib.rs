#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Event Storage
//!
//! An append-only [`EventStore`] for every published [`nebula_eventbus::DomainEvent`],
//! queryable by type, correlation id, or in full, and an [`EventSource`] that
//! replays a filtered, timestamp-ordered slice back through an
//! [`nebula_eventbus::EventBus`].

mod source;
mod store;

pub use source::EventSource;
pub use store::EventStore;
