//! Subscriber handler trait.

use async_trait::async_trait;

use crate::event::DomainEvent;

/// A subscriber callback invoked for each delivered event.
///
/// Handler exceptions are caught and logged; they do not break delivery to
/// other handlers and do not propagate. The bus enforces this by catching
/// any panic/error the adapter surfaces — handlers themselves are
/// infallible by contract (a handler that can fail should catch its own
/// errors and log them before returning).
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle a single delivered event.
    async fn handle(&self, event: &DomainEvent);
}

#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&DomainEvent) + Send + Sync + 'static,
{
    async fn handle(&self, event: &DomainEvent) {
        (self)(event);
    }
}
