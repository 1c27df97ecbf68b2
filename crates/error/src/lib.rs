#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Error
//!
//! Shared error taxonomy for every component of the Nebula Flow runtime
//! (event bus, extension system, task executor/scheduler, process manager).
//!
//! Components generally return `std::result::Result<T, RuntimeError>`.
//! [`RuntimeError`] carries a [`RuntimeErrorKind`] discriminant plus a
//! human-readable message and an optional boxed source: `{kind, message,
//! optional cause, optional structured detail}`.

mod error;
mod kind;

pub use error::RuntimeError;
pub use kind::RuntimeErrorKind;

/// Result alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;
