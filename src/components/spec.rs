//! # Component declaration spec.
//!
//! [`ComponentSpec`] binds a component instance to the declarations the
//! orchestrator consumes: ordering edges (`starts_after` / `starts_before`),
//! the optional flag, and the default enabled flag. Declarations are set once
//! at construction and immutable after registration.
//!
//! ## Edge flavors
//! - **Hard** ([`ComponentSpec::starts_after`] / [`ComponentSpec::starts_before`]):
//!   referencing an identity absent from the registry is a configuration
//!   error. A hard `starts_after` additionally makes the target a
//!   requirement: its disablement cascades (see the disablement propagator).
//! - **Soft** ([`ComponentSpec::soft_starts_after`]): ordering-only. An
//!   absent identity is dropped with a diagnostic event, and a disabled
//!   target does not cascade. Use this for components that may not exist in
//!   every build configuration.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use compvisor::{Component, ComponentSpec};
//!
//! # struct Storage; struct Replication;
//! # #[async_trait] impl Component for Storage {
//! #   fn name(&self) -> &str { "storage" }
//! #   fn as_any(&self) -> &dyn std::any::Any { self }
//! # }
//! # #[async_trait] impl Component for Replication {
//! #   fn name(&self) -> &str { "replication" }
//! #   fn as_any(&self) -> &dyn std::any::Any { self }
//! # }
//! let spec = ComponentSpec::new(Replication)
//!     .starts_after::<Storage>()
//!     .optional()
//!     .disabled();
//! assert_eq!(spec.name(), "replication");
//! ```

use std::any::Any;
use std::sync::Arc;

use super::component::{Component, ComponentId, ComponentRef};

/// A declared ordering edge toward another component identity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Dependency {
    /// Identity of the referenced component.
    pub id: ComponentId,
    /// Hard edges require the identity to be registered; soft edges are
    /// dropped with a diagnostic when it is not.
    pub hard: bool,
}

/// Declaration of a component's place in the dependency graph.
///
/// Wraps the component instance together with:
/// - `starts_after` / `starts_before` ordering edges;
/// - `optional`: whether disablement of this component is tolerated by
///   non-optional dependents;
/// - `enabled`: the component-declared default for the enabled flag.
pub struct ComponentSpec {
    pub(crate) id: ComponentId,
    pub(crate) component: ComponentRef,
    pub(crate) as_any: Arc<dyn Any + Send + Sync>,
    pub(crate) starts_after: Vec<Dependency>,
    pub(crate) starts_before: Vec<Dependency>,
    pub(crate) optional: bool,
    pub(crate) enabled: bool,
}

impl ComponentSpec {
    /// Creates a spec for the given component: enabled, non-optional, no
    /// declared edges.
    pub fn new<T: Component>(component: T) -> Self {
        let arc = Arc::new(component);
        Self {
            id: ComponentId::of::<T>(),
            component: arc.clone(),
            as_any: arc,
            starts_after: Vec::new(),
            starts_before: Vec::new(),
            optional: false,
            enabled: true,
        }
    }

    /// Declares that this component runs each phase after `T`.
    ///
    /// Hard edge: `T` must be registered, and a disabled `T` cascades into
    /// this component (disabling it when optional, failing configuration
    /// otherwise).
    pub fn starts_after<T: Component>(mut self) -> Self {
        self.starts_after.push(Dependency {
            id: ComponentId::of::<T>(),
            hard: true,
        });
        self
    }

    /// Declares a soft ordering edge after `T`.
    ///
    /// If `T` is not registered the edge is dropped with a diagnostic event;
    /// a disabled `T` never cascades through this edge.
    pub fn soft_starts_after<T: Component>(mut self) -> Self {
        self.starts_after.push(Dependency {
            id: ComponentId::of::<T>(),
            hard: false,
        });
        self
    }

    /// Declares that this component runs each phase before `T`.
    ///
    /// Hard edge: `T` must be registered. Pure ordering; carries no
    /// requirement semantics in either direction.
    pub fn starts_before<T: Component>(mut self) -> Self {
        self.starts_before.push(Dependency {
            id: ComponentId::of::<T>(),
            hard: true,
        });
        self
    }

    /// Marks the component optional: its disablement must not prevent the
    /// rest of the system from starting.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Registers the component disabled by default.
    ///
    /// Its `collect_options` hook still runs, so operators can re-enable it
    /// through configuration.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Identity of the wrapped component.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Human-readable name of the wrapped component.
    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// True if any declared edge references the component's own identity.
    pub(crate) fn has_self_edge(&self) -> bool {
        self.starts_after
            .iter()
            .chain(self.starts_before.iter())
            .any(|d| d.id == self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct A;
    struct B;

    #[async_trait]
    impl Component for A {
        fn name(&self) -> &str {
            "a"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[async_trait]
    impl Component for B {
        fn name(&self) -> &str {
            "b"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_defaults_enabled_non_optional() {
        let spec = ComponentSpec::new(A);
        assert!(spec.enabled);
        assert!(!spec.optional);
        assert!(spec.starts_after.is_empty());
        assert!(spec.starts_before.is_empty());
    }

    #[test]
    fn test_self_edge_detected() {
        let ok = ComponentSpec::new(A).starts_after::<B>();
        assert!(!ok.has_self_edge());

        let bad = ComponentSpec::new(A).starts_after::<A>();
        assert!(bad.has_self_edge());
    }

    #[test]
    fn test_edge_hardness() {
        let spec = ComponentSpec::new(A)
            .starts_after::<B>()
            .soft_starts_after::<B>();
        assert!(spec.starts_after[0].hard);
        assert!(!spec.starts_after[1].hard);
    }
}
