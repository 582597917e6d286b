//! # Component abstraction: the lifecycle hook surface.
//!
//! This module defines the [`Component`] trait (async, one hook per lifecycle
//! phase) and [`ComponentId`], the stable type-derived identity used to key
//! the registry and to express dependency edges. The common handle type is
//! [`ComponentRef`], an `Arc<dyn Component>` suitable for sharing across the
//! orchestrator.
//!
//! A component receives `&self` in every hook; component-owned mutable state
//! lives behind the component's own interior mutability (the orchestrator
//! never takes `&mut` access). Hooks run sequentially on the orchestrating
//! task, in dependency order for forward phases and reverse order for
//! teardown phases.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Orchestrator;
use crate::error::ComponentError;

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;

/// Stable identity of a component kind.
///
/// Derived from the concrete Rust type: at most one component per
/// `ComponentId` can live in a registry. Carries the type name for
/// diagnostics about identities that were never registered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ComponentId {
    /// Returns the identity token for component type `T`.
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the full Rust type name behind this identity.
    ///
    /// Prefer [`Component::name`] for operator-facing output; the type name
    /// is the fallback for identities absent from the registry.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Short type name with module path stripped (for diagnostics).
    pub fn short_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentId").field(&self.type_name).finish()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// # A self-contained subsystem unit managed by the orchestrator.
///
/// A `Component` has a stable [`name`](Component::name) and one async hook per
/// lifecycle phase. Every hook defaults to a no-op, so implementations only
/// override the phases they participate in.
///
/// ## Phase contract
/// - [`collect_options`](Component::collect_options): register the
///   configuration surface. Runs for **all** registered components, disabled
///   ones included, so that a disabled component's options stay parseable.
/// - [`validate_options`](Component::validate_options): reject bad
///   configuration (fatal for the whole process) or self-disable explicitly
///   via [`Orchestrator::disable_feature`]. Enabled components only.
/// - [`prepare`](Component::prepare): allocate internal resources. Must not
///   bind sockets, spawn threads, or perform externally visible side effects;
///   later components may still need to claim those shared resources.
/// - [`start`](Component::start): first phase where threads, sockets, and
///   serving are allowed. Runs in dependency order, so calls into
///   already-started dependencies are safe here.
/// - [`begin_shutdown`](Component::begin_shutdown): reverse order; signal
///   long-running work to wind down before `stop` is reached.
/// - [`stop`](Component::stop): reverse order; must tolerate being called on
///   a component whose `start` never ran to completion elsewhere in the order
///   (partial-startup teardown reuses this phase).
/// - [`unprepare`](Component::unprepare): reverse order; release everything,
///   returning the component to its pre-`prepare` observable state.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use compvisor::{Component, ComponentError, Orchestrator};
///
/// struct Metrics;
///
/// #[async_trait]
/// impl Component for Metrics {
///     fn name(&self) -> &str { "metrics" }
///     fn as_any(&self) -> &dyn std::any::Any { self }
///
///     async fn prepare(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
///         // allocate registries, no external side effects yet
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns a stable, human-readable component name for diagnostics.
    fn name(&self) -> &str;

    /// Returns `self` as [`Any`] to enable typed registry lookup.
    ///
    /// Implementations always read `fn as_any(&self) -> &dyn Any { self }`.
    fn as_any(&self) -> &dyn Any;

    /// Registers the component's configuration surface.
    ///
    /// Runs for every registered component regardless of the enabled flag.
    async fn collect_options(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Validates the component's parsed configuration.
    ///
    /// Returning an error is fatal for the whole process. A component that
    /// merely detects it is not applicable should instead call
    /// [`Orchestrator::disable_feature`] and return `Ok(())`.
    async fn validate_options(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Allocates internal resources without externally visible side effects.
    async fn prepare(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Starts serving: threads, sockets, and cross-component calls into
    /// already-started dependencies are allowed from here on.
    async fn start(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Signals the component to begin winding down (reverse order).
    ///
    /// Errors here are published but never halt the shutdown sequence.
    async fn begin_shutdown(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Stops serving (reverse order). Must be safe on a partially started
    /// system: components later in the order may already be gone.
    async fn stop(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// Releases all resources (reverse order). After this hook the component
    /// is observably back in its pre-`prepare` state.
    async fn unprepare(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }
}
