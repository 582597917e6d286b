//! # Topological scheduler: deterministic execution order.
//!
//! Produces one linear order over the enabled components that satisfies every
//! edge of the dependency graph; teardown phases use its pure reverse.
//!
//! ## Determinism
//! Kahn's algorithm with a `BTreeSet` ready-set of registration indices:
//! components with no relative ordering constraint are scheduled in
//! registration order, never in map iteration order. For a fixed
//! registration sequence and edge set the output is byte-for-byte identical
//! across runs.
//!
//! ## Failure mode
//! A cycle among enabled components aborts configuration with one concrete
//! cycle extracted from the unsorted remainder (every node left after Kahn's
//! pass has an enabled predecessor, so following predecessors must revisit a
//! node).

use std::collections::BTreeSet;

use super::graph::DepGraph;
use super::registry::Registry;
use crate::components::ComponentId;
use crate::error::ConfigError;

/// Computes the execution order over the enabled subgraph.
///
/// `enabled` is indexed by registration index and usually comes from
/// [`Registry::enabled_snapshot`] after disablement propagation.
pub(crate) fn execution_order(
    registry: &Registry,
    graph: &DepGraph,
    enabled: &[bool],
) -> Result<Vec<ComponentId>, ConfigError> {
    let n = registry.len();
    debug_assert_eq!(enabled.len(), n);

    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for (from, to) in graph.edges() {
        if enabled[from] && enabled[to] {
            succs[from].push(to);
            indegree[to] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..n)
        .filter(|&i| enabled[i] && indegree[i] == 0)
        .collect();
    let enabled_count = enabled.iter().filter(|&&e| e).count();

    let mut order = Vec::with_capacity(enabled_count);
    while let Some(&index) = ready.iter().next() {
        ready.remove(&index);
        order.push(registry.ids()[index]);
        for &next in &succs[index] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() < enabled_count {
        let remaining: BTreeSet<usize> = (0..n)
            .filter(|&i| enabled[i] && indegree[i] > 0)
            .collect();
        return Err(ConfigError::DependencyCycle {
            cycle: extract_cycle(registry, graph, &remaining),
        });
    }

    Ok(order)
}

/// Extracts one concrete cycle from the unsorted remainder, rendered in edge
/// direction.
fn extract_cycle(registry: &Registry, graph: &DepGraph, remaining: &BTreeSet<usize>) -> Vec<String> {
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); registry.len()];
    for (from, to) in graph.edges() {
        if remaining.contains(&from) && remaining.contains(&to) {
            preds[to].push(from);
        }
    }

    // Walk predecessors from any remaining node until one repeats; the
    // repeated suffix is a cycle (reversed relative to edge direction).
    let mut path: Vec<usize> = Vec::new();
    let mut cursor = match remaining.iter().next() {
        Some(&i) => i,
        None => return Vec::new(),
    };
    loop {
        if let Some(pos) = path.iter().position(|&p| p == cursor) {
            let mut cycle = vec![registry.name_at(cursor)];
            cycle.extend(path[pos + 1..].iter().rev().map(|&i| registry.name_at(i)));
            return cycle;
        }
        path.push(cursor);
        cursor = match preds[cursor].first() {
            Some(&p) => p,
            None => return path.iter().map(|&i| registry.name_at(i)).collect(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, ComponentSpec};
    use async_trait::async_trait;
    use std::any::Any;

    struct A;
    struct B;
    struct C;
    struct D;

    macro_rules! impl_component {
        ($ty:ident, $name:expr) => {
            #[async_trait]
            impl Component for $ty {
                fn name(&self) -> &str {
                    $name
                }
                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        };
    }

    impl_component!(A, "a");
    impl_component!(B, "b");
    impl_component!(C, "c");
    impl_component!(D, "d");

    fn order_names(r: &Registry) -> Vec<String> {
        let (graph, _) = DepGraph::build(r).unwrap();
        execution_order(r, &graph, &r.enabled_snapshot())
            .unwrap()
            .iter()
            .map(|&id| r.name_of(id))
            .collect()
    }

    #[test]
    fn test_unconstrained_components_keep_registration_order() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(C)).unwrap();
        r.add(ComponentSpec::new(A)).unwrap();
        r.add(ComponentSpec::new(B)).unwrap();
        assert_eq!(order_names(&r), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_edges_are_respected() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(A).starts_after::<B>()).unwrap();
        r.add(ComponentSpec::new(B)).unwrap();
        r.add(ComponentSpec::new(C).starts_after::<A>()).unwrap();
        assert_eq!(order_names(&r), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_order_is_reproducible() {
        let build = || {
            let mut r = Registry::new();
            r.add(ComponentSpec::new(D)).unwrap();
            r.add(ComponentSpec::new(B).starts_after::<D>()).unwrap();
            r.add(ComponentSpec::new(A).starts_before::<B>()).unwrap();
            r.add(ComponentSpec::new(C)).unwrap();
            order_names(&r)
        };
        let first = build();
        for _ in 0..20 {
            assert_eq!(build(), first);
        }
    }

    #[test]
    fn test_disabled_components_are_excluded() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(A)).unwrap();
        r.add(ComponentSpec::new(B).disabled()).unwrap();
        r.add(ComponentSpec::new(C)).unwrap();
        assert_eq!(order_names(&r), vec!["a", "c"]);
    }

    #[test]
    fn test_edge_through_disabled_component_does_not_constrain() {
        // a -> b -> c with b disabled: a and c schedule by registration order.
        let mut r = Registry::new();
        r.add(ComponentSpec::new(C).soft_starts_after::<B>()).unwrap();
        r.add(ComponentSpec::new(B).soft_starts_after::<A>().disabled())
            .unwrap();
        r.add(ComponentSpec::new(A)).unwrap();
        assert_eq!(order_names(&r), vec!["c", "a"]);
    }

    #[test]
    fn test_cycle_reports_concrete_cycle() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(A).starts_after::<C>()).unwrap();
        r.add(ComponentSpec::new(B).starts_after::<A>()).unwrap();
        r.add(ComponentSpec::new(C).starts_after::<B>()).unwrap();

        let (graph, _) = DepGraph::build(&r).unwrap();
        let err = execution_order(&r, &graph, &r.enabled_snapshot()).unwrap_err();
        let cycle = match err {
            ConfigError::DependencyCycle { cycle } => cycle,
            other => panic!("expected cycle error, got {other:?}"),
        };

        // All three participate and consecutive pairs are real edges.
        assert_eq!(cycle.len(), 3);
        let mut sorted = cycle.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c"]);
        let idx = |name: &str| match name {
            "a" => 0,
            "b" => 1,
            "c" => 2,
            _ => unreachable!(),
        };
        for pair in cycle.windows(2) {
            assert!(graph.contains(idx(&pair[0]), idx(&pair[1])), "bogus edge {pair:?}");
        }
        assert!(graph.contains(idx(&cycle[2]), idx(&cycle[0])));
    }

    #[test]
    fn test_cycle_among_disabled_components_is_ignored() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(A).starts_after::<B>().disabled().optional())
            .unwrap();
        r.add(ComponentSpec::new(B).starts_after::<A>().disabled().optional())
            .unwrap();
        r.add(ComponentSpec::new(C)).unwrap();
        assert_eq!(order_names(&r), vec!["c"]);
    }

    #[test]
    fn test_reverse_is_teardown_order() {
        let mut r = Registry::new();
        r.add(ComponentSpec::new(A)).unwrap();
        r.add(ComponentSpec::new(B).starts_after::<A>()).unwrap();
        r.add(ComponentSpec::new(C).starts_after::<B>()).unwrap();

        let forward = order_names(&r);
        let teardown: Vec<String> = forward.iter().rev().cloned().collect();
        assert_eq!(forward, vec!["a", "b", "c"]);
        assert_eq!(teardown, vec!["c", "b", "a"]);
    }
}
