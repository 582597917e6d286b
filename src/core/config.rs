//! # Global orchestrator configuration.
//!
//! Provides [`Config`], centralized settings for the orchestrator runtime.
//!
//! ## Field semantics
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped)
//! - `handle_signals`: install an OS signal listener that feeds the shutdown
//!   coordinator (SIGINT/SIGTERM/SIGQUIT, Ctrl-C on Windows)
//! - `dump_dependencies`: print the dependency report after the execution
//!   order freezes and return without running further phases
//! - `grace`: bound on draining subscriber queues at the end of `run()`
//!
//! ## Notes
//! All fields are public for flexibility. Tests typically set
//! `handle_signals = false` so no signal handlers are registered.

use std::time::Duration;

/// Global configuration for the orchestrator runtime.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1
    /// (enforced by the bus).
    pub bus_capacity: usize,

    /// Whether `run()` installs an OS termination-signal listener that
    /// requests a clean shutdown.
    pub handle_signals: bool,

    /// Diagnostics mode: after the execution order is frozen, print the
    /// order and the raw edge set, then return without executing `prepare`
    /// or later phases.
    pub dump_dependencies: bool,

    /// Maximum time to wait for subscriber queues to drain when `run()`
    /// finishes. Workers still busy after the bound are left detached.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `handle_signals = true`
    /// - `dump_dependencies = false`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            handle_signals: true,
            dump_dependencies: false,
            grace: Duration::from_secs(5),
        }
    }
}
