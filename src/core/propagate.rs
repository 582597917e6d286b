//! # Cascading disablement propagation.
//!
//! Before scheduling, the enabled set must be internally consistent: no
//! enabled component may hard-require a disabled one. This module computes
//! the fixed point with an explicit worklist (bounded, no recursion):
//!
//! ```text
//! seed: every disabled component
//! step: disabled D, enabled X with a hard `starts_after D`
//!         X optional      → disable X, enqueue X
//!         X non-optional  → ConfigError::RequiredDependencyDisabled
//! until: worklist empty (the enabled set only shrinks, so this terminates)
//! ```
//!
//! The propagator works on an enabled-flags snapshot so read-only callers
//! (the dependency report) can run it without mutating the registry; the
//! lifecycle driver applies the resulting cascade back to the registry and
//! publishes one event per disabled component.

use std::collections::VecDeque;

use super::registry::Registry;
use crate::error::ConfigError;

/// One component disabled by the cascade, with the dependency that caused it.
#[derive(Debug)]
pub(crate) struct Cascaded {
    /// Registration index of the newly disabled component.
    pub index: usize,
    /// Registration index of the disabled dependency.
    pub cause: usize,
}

/// Runs disablement propagation to its fixed point over `enabled`.
///
/// Returns the cascade in deterministic order. Soft edges never propagate,
/// and edges referencing unregistered identities are resolved (or rejected)
/// by the graph builder before this runs.
pub(crate) fn propagate_disablement(
    registry: &Registry,
    enabled: &mut [bool],
) -> Result<Vec<Cascaded>, ConfigError> {
    let n = registry.len();
    debug_assert_eq!(enabled.len(), n);

    // dependents[d] = components with a hard `starts_after` on d.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for index in 0..n {
        for dep in &registry.entry_at(index).spec.starts_after {
            if !dep.hard {
                continue;
            }
            if let Some(dep_index) = registry.index_of(dep.id) {
                dependents[dep_index].push(index);
            }
        }
    }

    let mut worklist: VecDeque<usize> = (0..n).filter(|&i| !enabled[i]).collect();
    let mut cascade = Vec::new();

    while let Some(disabled) = worklist.pop_front() {
        for &dependent in &dependents[disabled] {
            if !enabled[dependent] {
                continue;
            }
            if !registry.entry_at(dependent).spec.optional {
                return Err(ConfigError::RequiredDependencyDisabled {
                    component: registry.name_at(dependent),
                    dependency: registry.name_at(disabled),
                });
            }
            enabled[dependent] = false;
            cascade.push(Cascaded {
                index: dependent,
                cause: disabled,
            });
            worklist.push_back(dependent);
        }
    }

    Ok(cascade)
}
