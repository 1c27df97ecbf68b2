#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Event Bus
//!
//! Typed pub/sub distribution of [`DomainEvent`]s with wildcard subscribers,
//! per-type (and wildcard) [`BackpressureStrategy`] admission control, and
//! `EVENT_BEFORE_PUBLISH`/`EVENT_AFTER_PUBLISH` extension hooks.

mod backpressure;
mod bus;
mod event;
mod handler;

pub use backpressure::{BackpressureStrategy, MaxDepth, SlidingWindow, Unbounded};
pub use bus::EventBus;
pub use event::{DomainEvent, WILDCARD_TYPE};
pub use handler::EventHandler;
