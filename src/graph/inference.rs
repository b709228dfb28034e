//! Graph-to-graph passes: bidirectional inference and transitive reduction.
//!
//! Both passes read from the graph they are given and write into a private
//! copy, so edges added or removed while processing one document are never
//! seen as input for another document in the same pass.

use super::{leads_to_path_exists, Graph, RelationKind};

/// Add the inverse of every `LeadsTo` / `DependsOn` edge whose target exists.
///
/// `A leadsto B` adds `B dependson A`; `A dependson B` adds `B leadsto A`.
/// `InformedBy` is untouched. Running the pass twice gives the same graph as
/// running it once.
pub fn infer_bidirectional(graph: &Graph) -> Graph {
    let mut inferred = graph.clone();

    for (source, links) in graph.iter() {
        for kind in [RelationKind::LeadsTo, RelationKind::DependsOn] {
            let inverse = match kind.inverse() {
                Some(inverse) => inverse,
                None => continue,
            };
            for target in links.targets(kind) {
                if let Some(target_links) = inferred.get_mut(target) {
                    target_links.insert(inverse, source.clone());
                }
            }
        }
    }

    inferred
}

/// Remove `LeadsTo` edges already implied by a longer `LeadsTo` path.
///
/// For each document A, the edge A -> C is dropped when C is reachable from
/// some other direct target B of A. All reachability queries run against the
/// unreduced input, and removing A -> C also removes the paired `C dependson A`
/// back-edge.
///
/// On cyclic input the walk's visited set (seeded with A) can under-approximate
/// reachability; this never fails, but the result is only exact for acyclic graphs.
pub fn transitive_reduction(graph: &Graph) -> Graph {
    let snapshot = graph.snapshot(RelationKind::LeadsTo);
    let mut reduced = graph.clone();
    let mut removed = 0usize;

    for (source, targets) in &snapshot {
        for target in targets {
            let implied = targets
                .iter()
                .filter(|via| *via != target)
                .any(|via| leads_to_path_exists(&snapshot, source, via, target));

            if !implied {
                continue;
            }

            if let Some(links) = reduced.get_mut(source) {
                links.remove(RelationKind::LeadsTo, target);
            }
            if let Some(links) = reduced.get_mut(target) {
                links.remove(RelationKind::DependsOn, source);
            }
            removed += 1;
        }
    }

    log::debug!("transitive reduction removed {} leadsto edges", removed);
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeLinks;

    fn graph_of(edges: &[(&str, RelationKind, &str)], nodes: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for node in nodes {
            graph.insert(*node, NodeLinks::new());
        }
        for (source, kind, target) in edges {
            graph.get_mut(source).unwrap().insert(*kind, *target);
        }
        graph
    }

    fn set(graph: &Graph, id: &str, kind: RelationKind) -> Vec<String> {
        graph.get(id).unwrap().targets(kind).to_vec()
    }

    use RelationKind::{DependsOn, InformedBy, LeadsTo};

    #[test]
    fn test_infer_adds_inverse_edges() {
        let graph = graph_of(&[("A", LeadsTo, "B")], &["A", "B"]);
        let inferred = infer_bidirectional(&graph);
        assert_eq!(set(&inferred, "A", LeadsTo), vec!["B"]);
        assert_eq!(set(&inferred, "B", DependsOn), vec!["A"]);
        // input untouched
        assert!(set(&graph, "B", DependsOn).is_empty());
    }

    #[test]
    fn test_infer_depends_on_adds_leads_to() {
        let graph = graph_of(&[("A", DependsOn, "B")], &["A", "B"]);
        let inferred = infer_bidirectional(&graph);
        assert_eq!(set(&inferred, "B", LeadsTo), vec!["A"]);
    }

    #[test]
    fn test_infer_skips_dangling_and_informed_by() {
        let graph = graph_of(
            &[("A", LeadsTo, "ghost"), ("A", InformedBy, "B")],
            &["A", "B"],
        );
        let inferred = infer_bidirectional(&graph);
        assert!(inferred.get("ghost").is_none());
        assert!(inferred.get("B").unwrap().is_empty());
    }

    #[test]
    fn test_infer_does_not_cascade() {
        // A leadsto B adds B dependson A; that new edge must not in turn add
        // A leadsto B again or anything else within the same pass.
        let graph = graph_of(&[("A", LeadsTo, "B"), ("B", DependsOn, "C")], &["A", "B", "C"]);
        let inferred = infer_bidirectional(&graph);
        assert_eq!(set(&inferred, "B", DependsOn), vec!["C", "A"]);
        assert_eq!(set(&inferred, "C", LeadsTo), vec!["B"]);
        assert_eq!(set(&inferred, "A", LeadsTo), vec!["B"]);
    }

    #[test]
    fn test_infer_idempotent() {
        let graph = graph_of(
            &[("A", LeadsTo, "B"), ("B", DependsOn, "C"), ("C", LeadsTo, "A")],
            &["A", "B", "C"],
        );
        let once = infer_bidirectional(&graph);
        let twice = infer_bidirectional(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reduction_removes_implied_edge() {
        let graph = graph_of(
            &[("A", LeadsTo, "B"), ("A", LeadsTo, "C"), ("B", LeadsTo, "C")],
            &["A", "B", "C"],
        );
        let reduced = transitive_reduction(&infer_bidirectional(&graph));
        assert_eq!(set(&reduced, "A", LeadsTo), vec!["B"]);
        assert_eq!(set(&reduced, "B", LeadsTo), vec!["C"]);
        assert_eq!(set(&reduced, "C", DependsOn), vec!["B"]);
    }

    #[test]
    fn test_reduction_long_chain() {
        let graph = graph_of(
            &[
                ("A", LeadsTo, "B"),
                ("B", LeadsTo, "C"),
                ("C", LeadsTo, "D"),
                ("A", LeadsTo, "D"),
                ("B", LeadsTo, "D"),
            ],
            &["A", "B", "C", "D"],
        );
        let reduced = transitive_reduction(&graph);
        assert_eq!(set(&reduced, "A", LeadsTo), vec!["B"]);
        assert_eq!(set(&reduced, "B", LeadsTo), vec!["C"]);
        assert_eq!(set(&reduced, "C", LeadsTo), vec!["D"]);
    }

    #[test]
    fn test_reduction_uses_unreduced_snapshot() {
        // Both A->C and B->C are implied only through paths that themselves
        // contain removable edges; decisions must not depend on processing order.
        let graph = graph_of(
            &[
                ("A", LeadsTo, "B"),
                ("A", LeadsTo, "C"),
                ("A", LeadsTo, "D"),
                ("B", LeadsTo, "C"),
                ("B", LeadsTo, "D"),
                ("C", LeadsTo, "D"),
            ],
            &["A", "B", "C", "D"],
        );
        let reduced = transitive_reduction(&graph);
        assert_eq!(set(&reduced, "A", LeadsTo), vec!["B"]);
        assert_eq!(set(&reduced, "B", LeadsTo), vec!["C"]);
        assert_eq!(set(&reduced, "C", LeadsTo), vec!["D"]);
    }

    #[test]
    fn test_reduction_ignores_dangling_and_other_kinds() {
        let graph = graph_of(
            &[("A", LeadsTo, "ghost"), ("A", InformedBy, "B"), ("B", LeadsTo, "ghost")],
            &["A", "B"],
        );
        let reduced = transitive_reduction(&graph);
        assert_eq!(reduced, graph);
    }

    #[test]
    fn test_reduction_terminates_on_cycle() {
        let graph = graph_of(
            &[("A", LeadsTo, "B"), ("B", LeadsTo, "C"), ("C", LeadsTo, "A"), ("A", LeadsTo, "C")],
            &["A", "B", "C"],
        );
        let reduced = transitive_reduction(&graph);
        assert_eq!(set(&reduced, "A", LeadsTo), vec!["B"]);
        assert_eq!(set(&reduced, "C", LeadsTo), vec!["A"]);
    }
}
