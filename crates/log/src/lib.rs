#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Nebula Log
//!
//! A small `tracing-subscriber` initializer shared by every runtime binary
//! and test suite, so none of them re-derive `EnvFilter`/`fmt` boilerplate.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

const DEFAULT_FILTER: &str = "info";

/// Install a global `tracing` subscriber reading `RUST_LOG` (falling back to
/// `info` if unset), formatting to stdout.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed. Binaries
/// should call this once, at startup.
pub fn init() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();
}

/// Install a global `tracing` subscriber suited to test output: same
/// `RUST_LOG` resolution as [`init`], writing through the test harness's
/// captured writer, and tolerant of being called more than once (each test
/// binary runs this independently; only the first call wins).
pub fn init_for_tests() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_for_tests_does_not_panic_when_called_twice() {
        init_for_tests();
        init_for_tests();
    }
}
