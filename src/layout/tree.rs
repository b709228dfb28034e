//! Rooted tree layout: bounded descendant tree, bounded ancestor list, and
//! non-overlapping placement (vertical or radial).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

use super::{LayoutEdge, NodeRole, Point};
use crate::error::{NotegraphError, Result};
use crate::graph::{DocumentId, Graph, RelationKind};

/// Where nodes end up: stacked levels, or the same tree bent around the root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Vertical,
    Radial,
}

/// Tree layout tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum descendant depth below the root.
    pub child_depth: usize,
    /// Maximum ancestor depth above the root.
    pub parent_depth: usize,
    /// Slot width of a leaf.
    pub leaf_width: f64,
    /// Horizontal gap between sibling slots.
    pub sibling_gap: f64,
    /// Vertical distance between levels (radius step in radial mode).
    pub level_spacing: f64,
    pub mode: LayoutMode,
    /// Upper bound for both depths. Shared descendants are repeated per path,
    /// so node count can double with every level.
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            child_depth: 3,
            parent_depth: 2,
            leaf_width: 160.0,
            sibling_gap: 40.0,
            level_spacing: 120.0,
            mode: LayoutMode::Vertical,
            max_depth: 10,
        }
    }
}

impl TreeConfig {
    /// Check depths and spacing before a layout is built.
    pub fn validate(&self) -> Result<()> {
        if self.child_depth == 0 {
            return Err(NotegraphError::InvalidInput(
                "child_depth must be at least 1".to_string(),
            ));
        }
        if self.child_depth > self.max_depth || self.parent_depth > self.max_depth {
            return Err(NotegraphError::InvalidInput(format!(
                "child_depth {} / parent_depth {} exceed max_depth {}",
                self.child_depth, self.parent_depth, self.max_depth
            )));
        }
        if self.leaf_width <= 0.0 || self.level_spacing <= 0.0 || self.sibling_gap < 0.0 {
            return Err(NotegraphError::InvalidInput(
                "leaf_width and level_spacing must be positive, sibling_gap non-negative".to_string(),
            ));
        }
        // the gap between the two radial half-planes is only wide enough up to here
        if self.mode == LayoutMode::Radial && self.leaf_width > 2.0 * self.level_spacing {
            return Err(NotegraphError::InvalidInput(
                "radial mode needs leaf_width <= 2 * level_spacing".to_string(),
            ));
        }
        Ok(())
    }
}

/// A positioned node. For descendants `children` are further descendants; for
/// ancestors they are further ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: DocumentId,
    pub role: NodeRole,
    pub position: Point,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(id: &str, role: NodeRole) -> Self {
        Self {
            id: id.to_string(),
            role,
            position: Point::default(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, self included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Result of a rooted layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootedLayout {
    pub root: TreeNode,
    pub ancestors: Vec<TreeNode>,
    pub edges: Vec<LayoutEdge>,
}

/// Lay out `root_id`'s descendants (via `LeadsTo` and `InformedBy`) below it and
/// its ancestors (via `DependsOn` and documents naming it as `InformedBy`) above it.
pub fn build_rooted_layout(graph: &Graph, root_id: &str, config: &TreeConfig) -> Result<RootedLayout> {
    config.validate()?;
    if !graph.contains(root_id) {
        return Err(NotegraphError::DocumentNotFound(root_id.to_string()));
    }

    let builder = TreeBuilder {
        graph,
        informed_by: graph.informed_by_index(),
        config,
    };

    let mut root = builder.descendants(root_id, NodeRole::Root, 0, &HashSet::new());
    let mut ancestors = builder.ancestor_list(root_id);

    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    collect_descendant_edges(&root, &mut edges, &mut seen);
    for ancestor in &ancestors {
        collect_ancestor_edges(root_id, ancestor, &mut edges, &mut seen);
    }

    let root_width = subtree_width(&root, config);
    place(&mut root, -root_width / 2.0, 0, 1.0, config);
    let ancestors_width = forest_width(&ancestors, config);
    let mut cursor = -ancestors_width / 2.0;
    for ancestor in ancestors.iter_mut() {
        let width = subtree_width(ancestor, config);
        place(ancestor, cursor, 1, -1.0, config);
        cursor += width + config.sibling_gap;
    }

    if config.mode == LayoutMode::Radial {
        if ancestors.is_empty() {
            project_radial(&mut root, -root_width / 2.0, root_width, 0.0, 2.0 * PI, 0, config);
        } else {
            // Descendants take the lower half-plane, ancestors the upper one.
            // Each arc gives up `gap` at both ends, so on a ring of radius r the
            // two sides stay at least 2 r sin(gap) >= leaf_width apart.
            let gap = (config.leaf_width / (2.0 * config.level_spacing)).min(1.0).asin();
            let arc = PI - 2.0 * gap;
            project_radial(&mut root, -root_width / 2.0, root_width, gap, arc, 0, config);
            for ancestor in ancestors.iter_mut() {
                project_radial(ancestor, -ancestors_width / 2.0, ancestors_width, PI + gap, arc, 1, config);
            }
        }
    }

    log::debug!(
        "tree layout for {}: {} descendants, {} ancestor roots, {} edges",
        root_id,
        root.size() - 1,
        ancestors.len(),
        edges.len()
    );

    Ok(RootedLayout {
        root,
        ancestors,
        edges,
    })
}

struct TreeBuilder<'a> {
    graph: &'a Graph,
    informed_by: BTreeMap<DocumentId, Vec<DocumentId>>,
    config: &'a TreeConfig,
}

impl TreeBuilder<'_> {
    /// `path` holds the ids on the way down to this node only; siblings each
    /// get their own copy.
    fn descendants(&self, id: &str, role: NodeRole, depth: usize, path: &HashSet<DocumentId>) -> TreeNode {
        let mut node = TreeNode::leaf(id, role);
        if depth >= self.config.child_depth || path.contains(id) {
            return node;
        }

        let mut path = path.clone();
        path.insert(id.to_string());

        if let Some(links) = self.graph.get(id) {
            for kind in [RelationKind::LeadsTo, RelationKind::InformedBy] {
                for target in links.targets(kind) {
                    if self.graph.contains(target) {
                        node.children
                            .push(self.descendants(target, NodeRole::Linked(kind), depth + 1, &path));
                    }
                }
            }
        }
        node
    }

    fn parents(&self, id: &str) -> Vec<(DocumentId, RelationKind)> {
        let mut parents = Vec::new();
        if let Some(links) = self.graph.get(id) {
            for target in &links.depends_on {
                if self.graph.contains(target) {
                    parents.push((target.clone(), RelationKind::DependsOn));
                }
            }
        }
        if let Some(sources) = self.informed_by.get(id) {
            for source in sources {
                parents.push((source.clone(), RelationKind::InformedBy));
            }
        }
        parents
    }

    fn ancestor_list(&self, root_id: &str) -> Vec<TreeNode> {
        if self.config.parent_depth == 0 {
            return Vec::new();
        }
        let mut path = HashSet::new();
        path.insert(root_id.to_string());
        self.parents(root_id)
            .into_iter()
            .map(|(id, kind)| self.ancestor(&id, kind, 1, &path))
            .collect()
    }

    fn ancestor(&self, id: &str, kind: RelationKind, level: usize, path: &HashSet<DocumentId>) -> TreeNode {
        let mut node = TreeNode::leaf(id, NodeRole::Linked(kind));
        if level >= self.config.parent_depth || path.contains(id) {
            return node;
        }

        let mut path = path.clone();
        path.insert(id.to_string());

        node.children = self
            .parents(id)
            .into_iter()
            .map(|(parent, kind)| self.ancestor(&parent, kind, level + 1, &path))
            .collect();
        node
    }
}

fn push_edge(edge: LayoutEdge, edges: &mut Vec<LayoutEdge>, seen: &mut HashSet<LayoutEdge>) {
    if seen.insert(edge.clone()) {
        edges.push(edge);
    }
}

fn collect_descendant_edges(node: &TreeNode, edges: &mut Vec<LayoutEdge>, seen: &mut HashSet<LayoutEdge>) {
    for child in &node.children {
        if let NodeRole::Linked(kind) = child.role {
            push_edge(
                LayoutEdge {
                    source: node.id.clone(),
                    target: child.id.clone(),
                    kind,
                },
                edges,
                seen,
            );
        }
        collect_descendant_edges(child, edges, seen);
    }
}

/// `ancestor` sits above `below`: either `below dependson ancestor`, or
/// `ancestor informedby below`.
fn collect_ancestor_edges(
    below: &str,
    ancestor: &TreeNode,
    edges: &mut Vec<LayoutEdge>,
    seen: &mut HashSet<LayoutEdge>,
) {
    match ancestor.role {
        NodeRole::Linked(RelationKind::InformedBy) => push_edge(
            LayoutEdge {
                source: ancestor.id.clone(),
                target: below.to_string(),
                kind: RelationKind::InformedBy,
            },
            edges,
            seen,
        ),
        NodeRole::Linked(kind) => push_edge(
            LayoutEdge {
                source: below.to_string(),
                target: ancestor.id.clone(),
                kind,
            },
            edges,
            seen,
        ),
        _ => {}
    }
    for parent in &ancestor.children {
        collect_ancestor_edges(&ancestor.id, parent, edges, seen);
    }
}

/// Slot width: a leaf gets `leaf_width`, an inner node the children's widths
/// plus the gaps between them.
fn subtree_width(node: &TreeNode, config: &TreeConfig) -> f64 {
    if node.children.is_empty() {
        return config.leaf_width;
    }
    forest_width(&node.children, config).max(config.leaf_width)
}

fn forest_width(nodes: &[TreeNode], config: &TreeConfig) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let widths: f64 = nodes.iter().map(|n| subtree_width(n, config)).sum();
    widths + config.sibling_gap * (nodes.len() - 1) as f64
}

/// Place `node`'s slot starting at `left`, centered over its children.
/// `direction` is +1 for descendants (down) and -1 for ancestors (up).
fn place(node: &mut TreeNode, left: f64, level: usize, direction: f64, config: &TreeConfig) {
    let width = subtree_width(node, config);
    node.position = Point::new(
        left + width / 2.0,
        direction * level as f64 * config.level_spacing,
    );

    let span = forest_width(&node.children, config);
    let mut cursor = left + (width - span) / 2.0;
    for child in node.children.iter_mut() {
        let child_width = subtree_width(child, config);
        place(child, cursor, level + 1, direction, config);
        cursor += child_width + config.sibling_gap;
    }
}

/// Map the vertical layout onto a circle: horizontal slot position becomes an
/// angle inside `[arc_start, arc_start + arc_len)`, level becomes radius.
fn project_radial(
    node: &mut TreeNode,
    span_left: f64,
    span_width: f64,
    arc_start: f64,
    arc_len: f64,
    level: usize,
    config: &TreeConfig,
) {
    let fraction = if span_width > 0.0 {
        (node.position.x - span_left) / span_width
    } else {
        0.0
    };
    let angle = arc_start + fraction * arc_len;
    let radius = level as f64 * config.level_spacing;
    node.position = Point::new(radius * angle.cos(), radius * angle.sin());

    for child in node.children.iter_mut() {
        project_radial(child, span_left, span_width, arc_start, arc_len, level + 1, config);
    }
}
