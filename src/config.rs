//! # Service runtime configuration.
//!
//! Provides [`Config`], the settings for one service run.
//!
//! ## Sentinel values
//! - `worker_threads = 0` → tokio default (one worker per core)
//! - `grace = 0s` → do not wait for a handler still running after the bridge stopped

use std::time::Duration;

/// Configuration for a service run.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `worker_threads`: Worker threads of the runtime hosting bridge and handler (`0` = default)
/// - `grace`: How long the registration thread waits for a handler that is still
///   running once the bridge stopped (`0s` = abandon immediately)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Number of runtime worker threads.
    pub worker_threads: usize,

    /// Grace period for the handler after the final status report.
    ///
    /// A run that ends by handler completion never waits here. A run that ends
    /// on a failed report or an affinity violation closes the handler's links and
    /// waits up to `grace` for the handler to notice and return.
    pub grace: Duration,
}

impl Config {
    /// Returns the worker thread count as an `Option`.
    ///
    /// - `None` → runtime default
    /// - `Some(n)` → exactly `n` workers
    #[inline]
    pub fn worker_threads(&self) -> Option<usize> {
        if self.worker_threads == 0 {
            None
        } else {
            Some(self.worker_threads)
        }
    }

    /// Returns the handler grace period as an `Option`.
    #[inline]
    pub fn handler_grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `worker_threads = 0` (runtime default)
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            worker_threads: 0,
            grace: Duration::from_secs(30),
        }
    }
}
