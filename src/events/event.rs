//! # Lifecycle events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **State events**: the driver entered a new lifecycle state.
//! - **Scheduling events**: graph resolution outcomes (order computed,
//!   cascaded disablement, soft edges dropped).
//! - **Phase events**: per-phase progress and per-component failures.
//! - **Shutdown events**: external shutdown and fatal-abort requests.
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! component names, phase/state labels, and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use compvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ComponentFailed)
//!     .with_component("storage")
//!     .with_phase_label("start")
//!     .with_reason("port in use");
//!
//! assert_eq!(ev.kind, EventKind::ComponentFailed);
//! assert_eq!(ev.component.as_deref(), Some("storage"));
//! assert_eq!(ev.reason.as_deref(), Some("port in use"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State events ===
    /// The lifecycle driver entered a new state.
    ///
    /// Sets:
    /// - `state`: label of the state entered
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StateChanged,

    // === Scheduling events ===
    /// The execution order was (re)computed and frozen.
    ///
    /// Sets:
    /// - `reason`: rendered order, comma separated
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    OrderComputed,

    /// A component was disabled by cascading disablement propagation.
    ///
    /// Sets:
    /// - `component`: name of the disabled component
    /// - `reason`: name of the disabled dependency that caused the cascade
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ComponentDisabled,

    /// A soft edge referenced an unregistered identity and was dropped.
    ///
    /// Sets:
    /// - `component`: name of the declaring component
    /// - `reason`: type name of the missing identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    EdgeSkipped,

    // === Phase events ===
    /// A lifecycle phase is starting for the whole order.
    ///
    /// Sets:
    /// - `phase`: phase label
    /// - `state`: current driver state label
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PhaseStarted,

    /// A lifecycle phase completed for the whole order.
    ///
    /// Sets:
    /// - `phase`: phase label
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PhaseCompleted,

    /// A component hook returned an error.
    ///
    /// During forward phases the failure is also fatal; during teardown it is
    /// informational and teardown continues.
    ///
    /// Sets:
    /// - `component`: failing component name
    /// - `phase`: phase label
    /// - `reason`: error message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ComponentFailed,

    // === Shutdown events ===
    /// A clean shutdown was requested (signal, admin call, or component).
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// A fatal shutdown was requested; the driver will move to ABORTED.
    ///
    /// Sets:
    /// - `reason`: abort reason
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    FatalShutdownRequested,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the component or subscriber, if applicable.
    pub component: Option<Arc<str>>,
    /// Label of the lifecycle phase, if applicable.
    pub phase: Option<&'static str>,
    /// Label of the driver state, if applicable.
    pub state: Option<&'static str>,
    /// Human-readable reason (errors, dropped edges, order dumps).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            phase: None,
            state: None,
            reason: None,
        }
    }

    /// Attaches a component (or subscriber) name.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a phase label.
    #[inline]
    pub fn with_phase_label(mut self, phase: &'static str) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a driver state label.
    #[inline]
    pub fn with_state_label(mut self, state: &'static str) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub(crate) fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::StateChanged);
        let b = Event::new(EventKind::StateChanged);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::ComponentFailed)
            .with_component("net")
            .with_phase_label("stop")
            .with_reason("whoops");
        assert_eq!(ev.component.as_deref(), Some("net"));
        assert_eq!(ev.phase, Some("stop"));
        assert_eq!(ev.reason.as_deref(), Some("whoops"));
    }
}
