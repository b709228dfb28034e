//! Knowledge graph module: typed links between documents.
//!
//! Every document contributes one [`NodeLinks`] value (three target sets, one per
//! [`RelationKind`]). The [`Graph`] is rebuilt in full on every refresh; nothing in
//! it is shared with a previous build.

mod builder;
mod extraction;
mod inference;
mod traversal;

pub use builder::{build_graph, extract_document, BuildOptions};
pub use extraction::{extract_links, normalize_meta_value, scan_inline_tags, InlineTag};
pub use inference::{infer_bidirectional, transitive_reduction};
pub use traversal::{leads_to_path_exists, traverse_graph};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, store-assigned document key (e.g. `projects/roadmap`).
pub type DocumentId = String;

/// The three relationship kinds a document may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    LeadsTo,
    DependsOn,
    InformedBy,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::LeadsTo,
        RelationKind::DependsOn,
        RelationKind::InformedBy,
    ];

    /// Keyword used both as frontmatter key and as inline tag prefix.
    pub fn keyword(self) -> &'static str {
        match self {
            RelationKind::LeadsTo => "leadsto",
            RelationKind::DependsOn => "dependson",
            RelationKind::InformedBy => "informedby",
        }
    }

    /// Single-character inline shorthand.
    pub fn shorthand(self) -> char {
        match self {
            RelationKind::LeadsTo => '>',
            RelationKind::DependsOn => '<',
            RelationKind::InformedBy => '!',
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
    }

    pub fn from_shorthand(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.shorthand() == c)
    }

    /// `LeadsTo` and `DependsOn` mirror each other; `InformedBy` has no inverse.
    pub fn inverse(self) -> Option<Self> {
        match self {
            RelationKind::LeadsTo => Some(RelationKind::DependsOn),
            RelationKind::DependsOn => Some(RelationKind::LeadsTo),
            RelationKind::InformedBy => None,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Insertion-ordered set of target identifiers.
///
/// Duplicates and blank identifiers are rejected on insert, so the set never
/// holds an empty string or the same target twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet(Vec<DocumentId>);

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the target was newly added.
    pub fn insert(&mut self, target: impl Into<DocumentId>) -> bool {
        let target = target.into();
        if target.trim().is_empty() || self.contains(&target) {
            return false;
        }
        self.0.push(target);
        true
    }

    pub fn remove(&mut self, target: &str) -> bool {
        match self.0.iter().position(|t| t == target) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, target: &str) -> bool {
        self.0.iter().any(|t| t == target)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<DocumentId> {
        self.0.clone()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a DocumentId;
    type IntoIter = std::slice::Iter<'a, DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: Into<DocumentId>> FromIterator<S> for TargetSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TargetSet::new();
        for target in iter {
            set.insert(target);
        }
        set
    }
}

/// Outgoing links of one document, one target set per relation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinks {
    #[serde(rename = "leadsto")]
    pub leads_to: TargetSet,
    #[serde(rename = "dependson")]
    pub depends_on: TargetSet,
    #[serde(rename = "informedby")]
    pub informed_by: TargetSet,
}

impl NodeLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self, kind: RelationKind) -> &TargetSet {
        match kind {
            RelationKind::LeadsTo => &self.leads_to,
            RelationKind::DependsOn => &self.depends_on,
            RelationKind::InformedBy => &self.informed_by,
        }
    }

    pub fn targets_mut(&mut self, kind: RelationKind) -> &mut TargetSet {
        match kind {
            RelationKind::LeadsTo => &mut self.leads_to,
            RelationKind::DependsOn => &mut self.depends_on,
            RelationKind::InformedBy => &mut self.informed_by,
        }
    }

    pub fn insert(&mut self, kind: RelationKind, target: impl Into<DocumentId>) -> bool {
        self.targets_mut(kind).insert(target)
    }

    pub fn remove(&mut self, kind: RelationKind, target: &str) -> bool {
        self.targets_mut(kind).remove(target)
    }

    pub fn union<I, S>(&mut self, kind: RelationKind, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<DocumentId>,
    {
        let set = self.targets_mut(kind);
        for target in targets {
            set.insert(target);
        }
    }

    /// Number of declared outgoing targets over all kinds.
    pub fn degree(&self) -> usize {
        self.leads_to.len() + self.depends_on.len() + self.informed_by.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degree() == 0
    }
}

/// A typed, directed edge. Carries no identity beyond the triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: DocumentId,
    pub target: DocumentId,
    pub kind: RelationKind,
}

/// Summary counters logged after each build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub documents: usize,
    pub leads_to: usize,
    pub depends_on: usize,
    pub informed_by: usize,
    pub dangling: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents, {} leadsto, {} dependson, {} informedby, {} dangling",
            self.documents, self.leads_to, self.depends_on, self.informed_by, self.dangling
        )
    }
}

/// Mapping from document identifier to its outgoing links.
///
/// Backed by a `BTreeMap` so every traversal and every serialized form is
/// deterministic for a fixed set of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph {
    nodes: BTreeMap<DocumentId, NodeLinks>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document's links. Returns the previous entry if the id was already present.
    pub fn insert(&mut self, id: impl Into<DocumentId>, links: NodeLinks) -> Option<NodeLinks> {
        self.nodes.insert(id.into(), links)
    }

    pub fn get(&self, id: &str) -> Option<&NodeLinks> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut NodeLinks> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.nodes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, &NodeLinks)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every declared edge, dangling targets included.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (source, links) in &self.nodes {
            for kind in RelationKind::ALL {
                for target in links.targets(kind) {
                    edges.push(Edge {
                        source: source.clone(),
                        target: target.clone(),
                        kind,
                    });
                }
            }
        }
        edges
    }

    /// Edges whose target is a known document.
    pub fn resolved_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|edge| self.contains(&edge.target))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(NodeLinks::degree).sum()
    }

    /// Frozen copy of one relation's adjacency lists.
    pub fn snapshot(&self, kind: RelationKind) -> BTreeMap<DocumentId, Vec<DocumentId>> {
        self.nodes
            .iter()
            .map(|(id, links)| (id.clone(), links.targets(kind).to_vec()))
            .collect()
    }

    /// Inverted `InformedBy` relation: target -> documents that declare it.
    pub fn informed_by_index(&self) -> BTreeMap<DocumentId, Vec<DocumentId>> {
        let mut index: BTreeMap<DocumentId, Vec<DocumentId>> = BTreeMap::new();
        for (source, links) in &self.nodes {
            for target in &links.informed_by {
                index.entry(target.clone()).or_default().push(source.clone());
            }
        }
        index
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            documents: self.nodes.len(),
            ..GraphStats::default()
        };
        for links in self.nodes.values() {
            stats.leads_to += links.leads_to.len();
            stats.depends_on += links.depends_on.len();
            stats.informed_by += links.informed_by.len();
            stats.dangling += RelationKind::ALL
                .into_iter()
                .flat_map(|kind| links.targets(kind).iter())
                .filter(|target| !self.contains(target))
                .count();
        }
        stats
    }
}
