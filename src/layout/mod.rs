//! Layout engines: bounded rooted tree layout and whole-graph force layout.

pub mod force;
pub mod runner;
pub mod tree;

pub use force::{ForceConfig, ForceLayout, ForceNode, ForceSimulation, SimulationState};
pub use runner::{mount_force_layout, ForceLayoutHandle, Viewport};
pub use tree::{build_rooted_layout, LayoutMode, RootedLayout, TreeConfig, TreeNode};

use serde::{Deserialize, Serialize};

use crate::graph::RelationKind;

/// Layout edges are plain typed edges; rendering only needs the geometry.
pub use crate::graph::Edge as LayoutEdge;

/// 2D position or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// How a laid-out node relates to its parent (tree) or to the root (force).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Root,
    Linked(RelationKind),
    /// No direct link to the root.
    Unlinked,
}
