//! Monotonic wall-clock timestamps.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic wall-clock milliseconds since the Unix epoch.
///
/// Backed by `chrono::Utc::now()` truncated to millisecond precision rather
/// than `std::time::Instant` — the runtime needs a value that is meaningful
/// across process restarts (event storage, checkpoints) and serializes as a
/// plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// Construct from raw epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Raw epoch milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed between `self` and `other` (`other - self`).
    /// Negative if `self` is after `other`.
    #[must_use]
    pub const fn millis_until(self, other: Self) -> i64 {
        other.0 - self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_positive() {
        assert!(Timestamp::now().as_millis() > 0);
    }

    #[test]
    fn ordering_matches_millis() {
        let a = Timestamp::from_millis(100);
        let b = Timestamp::from_millis(200);
        assert!(a < b);
        assert_eq!(a.millis_until(b), 100);
    }

    #[test]
    fn serde_roundtrip() {
        let t = Timestamp::from_millis(1_700_000_000_000);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "1700000000000");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
