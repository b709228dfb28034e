//! Walks over the link graph: DFS reachability and depth-limited BFS.

use std::collections::{BTreeMap, HashSet, VecDeque};

use super::{DocumentId, Edge, Graph, RelationKind};

/// Depth-first search along a frozen `LeadsTo` adjacency map: is `target`
/// reachable from `from` in one or more hops?
///
/// The visited set starts with `origin` so walks that loop back to the node
/// being reduced stop there instead of running through it.
pub fn leads_to_path_exists(
    snapshot: &BTreeMap<DocumentId, Vec<DocumentId>>,
    origin: &str,
    from: &str,
    target: &str,
) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(origin);
    let mut stack: Vec<&str> = vec![from];

    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(next) = snapshot.get(node) {
            stack.extend(next.iter().rev().map(String::as_str));
        }
    }

    false
}

/// Traverse the graph breadth-first from `start`, following only `kinds`.
/// Returns every edge that discovers a new document within `max_depth` hops.
/// Dangling targets are not followed.
pub fn traverse_graph(
    graph: &Graph,
    start: &str,
    kinds: &[RelationKind],
    max_depth: usize,
) -> Vec<Edge> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut result = Vec::new();

    if !graph.contains(start) {
        return result;
    }

    queue.push_back((start.to_string(), 0));
    visited.insert(start.to_string());

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let links = match graph.get(&id) {
            Some(links) => links,
            None => continue,
        };

        for kind in kinds {
            for target in links.targets(*kind) {
                if !graph.contains(target) || visited.contains(target) {
                    continue;
                }
                visited.insert(target.clone());
                queue.push_back((target.clone(), depth + 1));
                result.push(Edge {
                    source: id.clone(),
                    target: target.clone(),
                    kind: *kind,
                });
            }
        }
    }

    result
}
