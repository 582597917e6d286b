//! # Lifecycle driver: the multi-phase state machine.
//!
//! [`LifecycleDriver`] walks the frozen execution order through each startup
//! phase and its pure reverse through each teardown phase, advancing one
//! process-wide [`State`] monotonically (the only backward move is into
//! [`State::Aborted`]).
//!
//! ## Phase plan
//! ```text
//! COLLECTING_OPTIONS   collect_options   all registered, forward
//! VALIDATING_OPTIONS   validate_options  enabled, forward (provisional order)
//!   └─ re-propagate disablement, freeze execution order
//! PREPARING            prepare           enabled, forward
//! STARTING             start             enabled, forward
//! RUNNING              ── park on the shutdown coordinator ──
//! SHUTTING_DOWN        begin_shutdown    enabled, reverse
//! STOPPING             stop              enabled, reverse
//! UNPREPARING          unprepare         enabled, reverse
//! STOPPED
//! ```
//!
//! ## Rules
//! - The driver runs sequentially on the calling task: one component at a
//!   time, in order, per phase. Phase P of component B never begins before
//!   phase P of every ordered predecessor of B completed.
//! - A `prepare`/`start` failure unwinds **only** the components ahead of
//!   the failing one in the frozen order, in reverse, exactly once each;
//!   the failing component itself and components not yet reached are never
//!   torn down.
//! - Teardown-phase hook errors are published and teardown continues.
//! - A fatal shutdown request moves the driver to ABORTED and still runs
//!   `stop`/`unprepare` best-effort over everything that started.

use std::fmt;

use super::graph::DepGraph;
use super::orchestrator::{DependencyReport, Orchestrator};
use super::propagate::propagate_disablement;
use super::scheduler::execution_order;
use crate::components::ComponentId;
use crate::error::{ComponentError, RuntimeError};
use crate::events::{Event, EventKind};

/// Process-wide lifecycle state, advanced monotonically by the driver.
///
/// [`State::Aborted`] is reachable from any non-terminal state on fatal
/// error; every other transition moves strictly forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Created, nothing ran yet.
    Uninitialized,
    /// `collect_options` runs for all registered components.
    CollectingOptions,
    /// `validate_options` runs for enabled components.
    ValidatingOptions,
    /// `prepare` runs forward over the frozen order.
    Preparing,
    /// `start` runs forward over the frozen order.
    Starting,
    /// Parked on the shutdown coordinator.
    Running,
    /// `begin_shutdown` runs in reverse order.
    ShuttingDown,
    /// `stop` runs in reverse order.
    Stopping,
    /// `unprepare` runs in reverse order.
    Unpreparing,
    /// Terminal: clean teardown finished.
    Stopped,
    /// Terminal: fatal error or startup failure; teardown was best-effort.
    Aborted,
}

impl State {
    /// Returns a short stable label (snake_case) for logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::CollectingOptions => "collecting_options",
            State::ValidatingOptions => "validating_options",
            State::Preparing => "preparing",
            State::Starting => "starting",
            State::Running => "running",
            State::ShuttingDown => "shutting_down",
            State::Stopping => "stopping",
            State::Unpreparing => "unpreparing",
            State::Stopped => "stopped",
            State::Aborted => "aborted",
        }
    }

    /// True for [`State::Stopped`] and [`State::Aborted`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Stopped | State::Aborted)
    }

    /// Whether the driver may move from `self` to `next`.
    ///
    /// Forward moves are always legal; the only backward-looking move is
    /// into [`State::Aborted`] from any non-terminal state.
    pub fn can_advance_to(&self, next: State) -> bool {
        if next == State::Aborted {
            return !self.is_terminal();
        }
        next > *self
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One stage of the startup/shutdown lifecycle, as seen by component hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Configuration surface registration (all registered components).
    CollectOptions,
    /// Configuration validation (enabled components).
    ValidateOptions,
    /// Resource allocation without external side effects.
    Prepare,
    /// Threads, sockets, serving.
    Start,
    /// Wind-down signal, reverse order.
    BeginShutdown,
    /// Stop serving, reverse order.
    Stop,
    /// Release everything, reverse order.
    Unprepare,
}

impl Phase {
    /// Returns a short stable label (snake_case) for logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::CollectOptions => "collect_options",
            Phase::ValidateOptions => "validate_options",
            Phase::Prepare => "prepare",
            Phase::Start => "start",
            Phase::BeginShutdown => "begin_shutdown",
            Phase::Stop => "stop",
            Phase::Unprepare => "unprepare",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A forward-phase failure: which position failed, and the resulting error.
struct PhaseFailure {
    index: usize,
    error: RuntimeError,
}

/// Walks the execution order through every lifecycle phase.
pub(crate) struct LifecycleDriver<'a> {
    orch: &'a Orchestrator,
    state: State,
}

impl<'a> LifecycleDriver<'a> {
    pub fn new(orch: &'a Orchestrator) -> Self {
        Self {
            orch,
            state: State::Uninitialized,
        }
    }

    /// Runs the whole lifecycle: options, scheduling, startup, the running
    /// wait, and teardown. Returns the first fatal error, if any.
    pub async fn run(&mut self) -> Result<(), RuntimeError> {
        self.advance(State::CollectingOptions);
        if let Err(e) = self.collect_options().await {
            self.abort();
            return Err(e);
        }

        // Provisional order for option validation; self-disables during
        // validate_options are honored by the recompute below.
        let provisional = match self.resolve(true) {
            Ok((_, order)) => order,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        self.advance(State::ValidatingOptions);
        if let Err(failure) = self.forward_phase(Phase::ValidateOptions, &provisional).await {
            self.abort();
            return Err(failure.error);
        }

        let (graph, order) = match self.resolve(false) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        self.orch.freeze();
        self.publish_order(&order);

        if self.orch.config().dump_dependencies {
            let report = DependencyReport::from_parts(self.orch, &graph, &order);
            println!("{report}");
            self.advance(State::Stopped);
            return Ok(());
        }

        self.advance(State::Preparing);
        if let Err(failure) = self.forward_phase(Phase::Prepare, &order).await {
            self.abort();
            self.reverse_phase(Phase::Unprepare, &order[..failure.index])
                .await;
            return Err(failure.error);
        }

        self.advance(State::Starting);
        if let Err(failure) = self.forward_phase(Phase::Start, &order).await {
            self.abort();
            // Only components ahead of the failing one are unwound; the
            // failing component and everything after it are left alone.
            self.reverse_phase(Phase::Stop, &order[..failure.index]).await;
            self.reverse_phase(Phase::Unprepare, &order[..failure.index])
                .await;
            return Err(failure.error);
        }

        self.advance(State::Running);
        self.orch.shutdown_coordinator().wait().await;

        if self.orch.shutdown_coordinator().is_fatal() {
            self.abort();
            self.reverse_phase(Phase::Stop, &order).await;
            self.reverse_phase(Phase::Unprepare, &order).await;
            let reason = self
                .orch
                .shutdown_coordinator()
                .fatal_reason()
                .unwrap_or_else(|| "unspecified".to_string());
            return Err(RuntimeError::Aborted { reason });
        }

        self.advance(State::ShuttingDown);
        self.reverse_phase(Phase::BeginShutdown, &order).await;
        self.advance(State::Stopping);
        self.reverse_phase(Phase::Stop, &order).await;
        self.advance(State::Unpreparing);
        self.reverse_phase(Phase::Unprepare, &order).await;
        self.advance(State::Stopped);
        Ok(())
    }

    /// Builds the graph, propagates disablement into the registry, and
    /// computes the execution order. `announce_skips` suppresses duplicate
    /// soft-edge diagnostics on the second pass.
    fn resolve(&self, announce_skips: bool) -> Result<(DepGraph, Vec<ComponentId>), RuntimeError> {
        let registry = self.orch.registry();
        let (graph, skipped) = DepGraph::build(registry)?;
        if announce_skips {
            for skip in &skipped {
                self.orch.publish(
                    Event::new(EventKind::EdgeSkipped)
                        .with_component(skip.component.clone())
                        .with_reason(skip.missing),
                );
            }
        }

        let mut enabled = registry.enabled_snapshot();
        let cascade = propagate_disablement(registry, &mut enabled)?;
        for c in &cascade {
            registry.set_enabled_at(c.index, false);
            self.orch.publish(
                Event::new(EventKind::ComponentDisabled)
                    .with_component(registry.name_at(c.index))
                    .with_reason(registry.name_at(c.cause)),
            );
        }

        let order = execution_order(registry, &graph, &enabled)?;
        Ok((graph, order))
    }

    /// `collect_options` runs for every registered component, disabled ones
    /// included, in registration order.
    async fn collect_options(&self) -> Result<(), RuntimeError> {
        let all: Vec<ComponentId> = self.orch.registry().ids().to_vec();
        self.forward_phase(Phase::CollectOptions, &all)
            .await
            .map_err(|f| f.error)
    }

    /// Runs one forward phase over `order`, stopping at the first failure.
    async fn forward_phase(
        &self,
        phase: Phase,
        order: &[ComponentId],
    ) -> Result<(), PhaseFailure> {
        self.publish_phase(EventKind::PhaseStarted, phase);
        for (index, &id) in order.iter().enumerate() {
            if let Err(source) = self.dispatch(phase, id).await {
                let component = self.orch.registry().name_of(id);
                self.publish_component_failure(phase, &component, &source);
                return Err(PhaseFailure {
                    index,
                    error: RuntimeError::Phase {
                        component,
                        phase,
                        source,
                    },
                });
            }
        }
        self.publish_phase(EventKind::PhaseCompleted, phase);
        Ok(())
    }

    /// Runs one teardown phase in reverse over `slice`, best-effort: hook
    /// errors are published and the walk continues.
    async fn reverse_phase(&self, phase: Phase, slice: &[ComponentId]) {
        self.publish_phase(EventKind::PhaseStarted, phase);
        for &id in slice.iter().rev() {
            if let Err(source) = self.dispatch(phase, id).await {
                let component = self.orch.registry().name_of(id);
                self.publish_component_failure(phase, &component, &source);
            }
        }
        self.publish_phase(EventKind::PhaseCompleted, phase);
    }

    /// Invokes one component hook.
    async fn dispatch(&self, phase: Phase, id: ComponentId) -> Result<(), ComponentError> {
        let component = self
            .orch
            .registry()
            .entry(id)
            .expect("ordered identity missing from registry")
            .spec
            .component
            .clone();
        match phase {
            Phase::CollectOptions => component.collect_options(self.orch).await,
            Phase::ValidateOptions => component.validate_options(self.orch).await,
            Phase::Prepare => component.prepare(self.orch).await,
            Phase::Start => component.start(self.orch).await,
            Phase::BeginShutdown => component.begin_shutdown(self.orch).await,
            Phase::Stop => component.stop(self.orch).await,
            Phase::Unprepare => component.unprepare(self.orch).await,
        }
    }

    fn publish_order(&self, order: &[ComponentId]) {
        let registry = self.orch.registry();
        let rendered = order
            .iter()
            .map(|&id| registry.name_of(id))
            .collect::<Vec<_>>()
            .join(", ");
        self.orch
            .publish(Event::new(EventKind::OrderComputed).with_reason(rendered));
    }

    fn advance(&mut self, next: State) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid lifecycle transition {} -> {}",
            self.state,
            next
        );
        self.state = next;
        self.orch
            .publish(Event::new(EventKind::StateChanged).with_state_label(next.as_label()));
    }

    fn abort(&mut self) {
        if !self.state.is_terminal() {
            self.state = State::Aborted;
            self.orch.publish(
                Event::new(EventKind::StateChanged).with_state_label(State::Aborted.as_label()),
            );
        }
    }

    fn publish_phase(&self, kind: EventKind, phase: Phase) {
        self.orch.publish(
            Event::new(kind)
                .with_phase_label(phase.as_label())
                .with_state_label(self.state.as_label()),
        );
    }

    fn publish_component_failure(&self, phase: Phase, component: &str, source: &ComponentError) {
        self.orch.publish(
            Event::new(EventKind::ComponentFailed)
                .with_component(component.to_string())
                .with_phase_label(phase.as_label())
                .with_reason(source.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_ordered() {
        assert!(State::Uninitialized < State::CollectingOptions);
        assert!(State::Starting < State::Running);
        assert!(State::Unpreparing < State::Stopped);
    }

    #[test]
    fn test_forward_transitions_are_legal() {
        assert!(State::Uninitialized.can_advance_to(State::CollectingOptions));
        assert!(State::Running.can_advance_to(State::ShuttingDown));
        // Jumping over states forward is legal (dump mode goes straight to
        // Stopped after freezing the order).
        assert!(State::ValidatingOptions.can_advance_to(State::Stopped));
    }

    #[test]
    fn test_backward_transitions_are_illegal() {
        assert!(!State::Running.can_advance_to(State::Preparing));
        assert!(!State::Stopped.can_advance_to(State::Running));
        assert!(!State::Running.can_advance_to(State::Running));
    }

    #[test]
    fn test_abort_reachable_from_non_terminal_only() {
        assert!(State::Uninitialized.can_advance_to(State::Aborted));
        assert!(State::Running.can_advance_to(State::Aborted));
        assert!(!State::Stopped.can_advance_to(State::Aborted));
        assert!(!State::Aborted.can_advance_to(State::Aborted));
    }

    #[test]
    fn test_labels_are_snake_case() {
        assert_eq!(State::ShuttingDown.as_label(), "shutting_down");
        assert_eq!(Phase::BeginShutdown.as_label(), "begin_shutdown");
        assert_eq!(Phase::CollectOptions.to_string(), "collect_options");
    }
}
