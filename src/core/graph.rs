//! # Dependency graph derived from component declarations.
//!
//! [`DepGraph`] symmetrizes every component's `starts_after` /
//! `starts_before` declarations into one directed edge set over registration
//! indices: edge `(a, b)` means "`a` must complete a given phase before `b`
//! starts the same phase".
//!
//! ## Rules
//! - Redundant declarations (A after B, and B before A) collapse into one
//!   edge: the edge container is a set, not a multiset.
//! - A **hard** edge referencing an unregistered identity is a configuration
//!   error surfaced before any phase runs.
//! - A **soft** edge referencing an unregistered identity is dropped and
//!   reported back to the caller for a diagnostic event.
//! - The graph covers all registered components; restriction to the enabled
//!   subset happens in the scheduler.

use std::collections::BTreeSet;

use super::registry::Registry;
use crate::error::ConfigError;

/// A soft edge that was dropped because its target is not registered.
#[derive(Debug)]
pub(crate) struct SkippedEdge {
    /// Name of the declaring component.
    pub component: String,
    /// Type name of the missing identity.
    pub missing: &'static str,
}

/// Directed ordering edges over registration indices.
#[derive(Debug)]
pub(crate) struct DepGraph {
    edges: BTreeSet<(usize, usize)>,
}

impl DepGraph {
    /// Builds the edge set from every registered component's declarations.
    pub fn build(registry: &Registry) -> Result<(Self, Vec<SkippedEdge>), ConfigError> {
        let mut edges = BTreeSet::new();
        let mut skipped = Vec::new();

        for index in 0..registry.len() {
            let entry = registry.entry_at(index);

            for dep in &entry.spec.starts_after {
                match registry.index_of(dep.id) {
                    // dep must complete each phase before this component.
                    Some(dep_index) => {
                        edges.insert((dep_index, index));
                    }
                    None if dep.hard => {
                        return Err(ConfigError::UnknownDependency {
                            component: entry.spec.name().to_string(),
                            dependency: dep.id.type_name().to_string(),
                        });
                    }
                    None => skipped.push(SkippedEdge {
                        component: entry.spec.name().to_string(),
                        missing: dep.id.type_name(),
                    }),
                }
            }

            for dep in &entry.spec.starts_before {
                match registry.index_of(dep.id) {
                    // this component must complete each phase before dep.
                    Some(dep_index) => {
                        edges.insert((index, dep_index));
                    }
                    None => {
                        return Err(ConfigError::UnknownDependency {
                            component: entry.spec.name().to_string(),
                            dependency: dep.id.type_name().to_string(),
                        });
                    }
                }
            }
        }

        Ok((Self { edges }, skipped))
    }

    /// Iterates all edges as `(from, to)` registration-index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    #[cfg(test)]
    pub fn contains(&self, from: usize, to: usize) -> bool {
        self.edges.contains(&(from, to))
    }
}
