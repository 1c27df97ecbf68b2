//! Backpressure strategies gating publish acceptance.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A policy deciding whether to accept an incoming event given the current
/// in-flight depth for its type (or for the wildcard gate).
///
/// Backpressure is advisory: a rejection is a silent drop of that publish,
/// never a block on the caller.
pub trait BackpressureStrategy: Send + Sync + 'static {
    /// Returns `false` to drop the event.
    fn should_accept(&self, current_depth: usize) -> bool;

    /// Called once per accepted or rejected event so rate-based strategies
    /// can track recent activity. Default no-op for depth-only strategies.
    fn record(&self, _accepted: bool) {}
}

/// No limit — every event is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl BackpressureStrategy for Unbounded {
    fn should_accept(&self, _current_depth: usize) -> bool {
        true
    }
}

/// Rejects once `current_depth` reaches `max`.
#[derive(Debug, Clone, Copy)]
pub struct MaxDepth {
    max: usize,
}

impl MaxDepth {
    /// Construct a strategy that rejects once depth reaches `max`.
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { max }
    }
}

impl BackpressureStrategy for MaxDepth {
    fn should_accept(&self, current_depth: usize) -> bool {
        current_depth < self.max
    }
}

/// Rejects once more than `max` events have been accepted within `window`.
///
/// Oldest-first eviction from a `VecDeque`, the same shape as a
/// sliding-window rate limiter applied here to admission control instead of
/// failure-rate tracking.
pub struct SlidingWindow {
    max: usize,
    window: Duration,
    entries: parking_lot::Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    /// Allow at most `max` accepted events per `window`.
    #[must_use]
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            entries: parking_lot::Mutex::new(VecDeque::with_capacity(max)),
        }
    }

    fn prune(entries: &mut VecDeque<Instant>, window: Duration) {
        let now = Instant::now();
        while let Some(front) = entries.front() {
            if now.duration_since(*front) > window {
                entries.pop_front();
            } else {
                break;
            }
        }
    }
}

impl BackpressureStrategy for SlidingWindow {
    fn should_accept(&self, _current_depth: usize) -> bool {
        let mut entries = self.entries.lock();
        Self::prune(&mut entries, self.window);
        entries.len() < self.max
    }

    fn record(&self, accepted: bool) {
        if !accepted {
            return;
        }
        let mut entries = self.entries.lock();
        Self::prune(&mut entries, self.window);
        entries.push_back(Instant::now());
    }
}
