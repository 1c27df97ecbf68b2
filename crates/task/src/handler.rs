//! The type-erased task handler trait and a typed adapter.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use async_trait::async_trait;
use nebula_error::{Result, RuntimeError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::TaskContext;

/// Type-erased handler invoked by the executor, JSON in and JSON out.
///
/// Task authors should not implement this directly — register via
/// [`crate::TypedTaskHandler`] unless they genuinely need the erased form.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Run one attempt, returning the JSON result.
    async fn execute(&self, ctx: TaskContext) -> Result<Value>;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Adapts a strongly-typed `Fn(TaskContext, I) -> Future<Result<O>>` closure
/// into a [`TaskHandler`], deserializing input and serializing output at the
/// registry boundary.
pub struct TypedTaskHandler<I, O, F> {
    func: F,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O, F, Fut> TypedTaskHandler<I, O, F>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(TaskContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O>> + Send,
{
    /// Wrap `func` as a [`TaskHandler`].
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }

    fn call(&self, ctx: TaskContext, input: I) -> BoxFuture<'_, Result<O>> {
        Box::pin((self.func)(ctx, input))
    }
}

#[async_trait]
impl<I, O, F, Fut> TaskHandler for TypedTaskHandler<I, O, F>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(TaskContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O>> + Send,
{
    async fn execute(&self, ctx: TaskContext) -> Result<Value> {
        let input: I = serde_json::from_value(ctx.input.clone())
            .map_err(|err| RuntimeError::invalid_definition(err.to_string()))?;
        let output = self.call(ctx, input).await?;
        serde_json::to_value(output).map_err(|err| RuntimeError::handler_failure(err.to_string()))
    }
}
