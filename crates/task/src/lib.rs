#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Task
//!
//! Task type registration: [`TaskDefinition`], [`RetryPolicy`]/[`BackoffStrategy`],
//! the type-erased [`TaskHandler`] trait with its [`TypedTaskHandler`] adapter,
//! and the [`TaskRegistry`] mapping task type to definition.

mod context;
mod definition;
mod handler;
mod registry;
mod retry;

pub use context::TaskContext;
pub use definition::TaskDefinition;
pub use handler::{TaskHandler, TypedTaskHandler};
pub use registry::TaskRegistry;
pub use retry::{BackoffStrategy, RetryPolicy};
