//! # Component registry: exclusive owner of all components.
//!
//! The [`Registry`] maps [`ComponentId`] to registered components and
//! remembers the registration sequence, which is the deterministic tie-break
//! source for the scheduler.
//!
//! ## Rules
//! - Membership is populated during registration (builder) and immutable
//!   afterwards; only the per-component enabled flags may change, and only
//!   before the execution order freezes.
//! - Typed lookup of an unregistered component is a programming error (a
//!   broken dependency declaration) and fails loudly with a panic; use
//!   [`Registry::try_feature`] via
//!   [`Orchestrator::try_feature`](crate::Orchestrator::try_feature) when
//!   absence is a legitimate outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::components::{Component, ComponentId, ComponentRef, ComponentSpec};
use crate::error::ConfigError;

/// Registered component with its runtime flags.
pub(crate) struct Entry {
    /// The declaration spec, including the component handle and edges.
    pub spec: ComponentSpec,
    /// Current enabled flag. Mutated only before the order freezes.
    pub enabled: AtomicBool,
    /// Position in the registration sequence.
    pub index: usize,
}

impl Entry {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Owner of all components, keyed by identity.
pub(crate) struct Registry {
    entries: HashMap<ComponentId, Entry>,
    // Registration order; also the scheduler's tie-break order.
    sequence: Vec<ComponentId>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sequence: Vec::new(),
        }
    }

    /// Inserts a component spec.
    ///
    /// Fails on duplicate identity and on self-edges.
    pub fn add(&mut self, spec: ComponentSpec) -> Result<(), ConfigError> {
        if spec.has_self_edge() {
            return Err(ConfigError::SelfDependency {
                component: spec.name().to_string(),
            });
        }
        if self.entries.contains_key(&spec.id()) {
            return Err(ConfigError::DuplicateComponent {
                component: spec.name().to_string(),
            });
        }

        let id = spec.id();
        let enabled = spec.enabled;
        let index = self.sequence.len();
        self.entries.insert(
            id,
            Entry {
                spec,
                enabled: AtomicBool::new(enabled),
                index,
            },
        );
        self.sequence.push(id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// All identities in registration order.
    pub fn ids(&self) -> &[ComponentId] {
        &self.sequence
    }

    pub fn entry(&self, id: ComponentId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn entry_at(&self, index: usize) -> &Entry {
        self.entries
            .get(&self.sequence[index])
            .expect("registry sequence out of sync")
    }

    pub fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.entries.get(&id).map(|e| e.index)
    }

    /// Shared handle to the component at the given registration index.
    pub fn component_at(&self, index: usize) -> ComponentRef {
        self.entry_at(index).spec.component.clone()
    }

    /// Operator-facing name for an identity: the declared component name when
    /// registered, the short type name otherwise.
    pub fn name_of(&self, id: ComponentId) -> String {
        match self.entries.get(&id) {
            Some(e) => e.spec.name().to_string(),
            None => id.short_name().to_string(),
        }
    }

    pub fn name_at(&self, index: usize) -> String {
        self.entry_at(index).spec.name().to_string()
    }

    pub fn is_enabled_at(&self, index: usize) -> bool {
        self.entry_at(index).is_enabled()
    }

    pub fn set_enabled_at(&self, index: usize, enabled: bool) {
        self.entry_at(index).enabled.store(enabled, Ordering::SeqCst);
    }

    /// Snapshot of the enabled flags, indexed by registration index.
    pub fn enabled_snapshot(&self) -> Vec<bool> {
        (0..self.len()).map(|i| self.is_enabled_at(i)).collect()
    }

    /// Identities of all enabled components, in registration order.
    pub fn enabled_view(&self) -> Vec<ComponentId> {
        self.sequence
            .iter()
            .copied()
            .filter(|id| self.entries[id].is_enabled())
            .collect()
    }

    pub fn has<T: Component>(&self) -> bool {
        self.entries.contains_key(&ComponentId::of::<T>())
    }

    /// Typed lookup; `None` when `T` was never registered.
    pub fn try_feature<T: Component>(&self) -> Option<std::sync::Arc<T>> {
        let entry = self.entries.get(&ComponentId::of::<T>())?;
        entry.spec.as_any.clone().downcast::<T>().ok()
    }

    /// Typed lookup that fails loudly on absence.
    ///
    /// # Panics
    /// Panics when `T` was never registered; this indicates a broken
    /// dependency declaration, not a recoverable runtime condition.
    pub fn feature<T: Component>(&self) -> std::sync::Arc<T> {
        match self.try_feature::<T>() {
            Some(c) => c,
            None => panic!(
                "component '{}' is not registered; declare it before looking it up",
                ComponentId::of::<T>().type_name()
            ),
        }
    }

    /// Typed lookup that additionally fails loudly when `T` is disabled.
    ///
    /// # Panics
    /// Panics when `T` is unregistered or disabled.
    pub fn enabled_feature<T: Component>(&self) -> std::sync::Arc<T> {
        let id = ComponentId::of::<T>();
        let entry = match self.entries.get(&id) {
            Some(e) => e,
            None => panic!(
                "component '{}' is not registered; declare it before looking it up",
                id.type_name()
            ),
        };
        assert!(
            entry.is_enabled(),
            "component '{}' is disabled; guard the lookup with is_enabled()",
            entry.spec.name()
        );
        entry
            .spec
            .as_any
            .clone()
            .downcast::<T>()
            .expect("identity/type mismatch in registry")
    }
}
