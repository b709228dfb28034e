//! Force-directed layout of the whole graph.
//!
//! Each sub-step computes every force from the positions left by the previous
//! sub-step, then integrates all nodes at once (semi-implicit Euler: velocity
//! first, position from the new velocity). Repulsion is pairwise, O(n^2).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use super::{LayoutEdge, NodeRole, Point};
use crate::graph::{DocumentId, Graph, RelationKind};

/// Floor added to squared distances before dividing.
const MIN_DISTANCE_SQ: f64 = 0.01;
/// Half-width of the uniform jitter added to the initial circle placement.
const INITIAL_JITTER: f64 = 5.0;
const MIN_INITIAL_RADIUS: f64 = 50.0;

/// Ticks `0..FAST_TICKS` run [`FAST_SUBSTEPS`] sub-steps per frame.
const FAST_TICKS: u32 = 60;
const FAST_SUBSTEPS: u32 = 4;
/// Ticks `FAST_TICKS..MEDIUM_TICKS` run [`MEDIUM_SUBSTEPS`].
const MEDIUM_TICKS: u32 = 200;
const MEDIUM_SUBSTEPS: u32 = 2;

/// Force layout tuning. Every field has a default, so partial TOML/JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Stroke width passed through to renderers.
    pub edge_width: f64,
    /// Radius of a node with no edges.
    pub node_radius: f64,
    /// Inverse-square repulsion constant.
    pub repulsion: f64,
    /// Hookean spring stiffness.
    pub spring_stiffness: f64,
    /// Spring rest length.
    pub rest_length: f64,
    /// Pull toward the origin, proportional to distance.
    pub gravity: f64,
    /// Velocity multiplier applied every sub-step, in (0, 1).
    pub damping: f64,
    /// Frames before the simulation settles.
    pub max_ticks: u32,
    /// Delay between frames of a mounted layout; 0 only yields.
    pub frame_interval_ms: u64,
    /// Seed for the initial jitter. None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            edge_width: 1.5,
            node_radius: 6.0,
            repulsion: 1800.0,
            spring_stiffness: 0.02,
            rest_length: 90.0,
            gravity: 0.01,
            damping: 0.85,
            max_ticks: 300,
            frame_interval_ms: 16,
            seed: None,
        }
    }
}

/// Lifecycle of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationState {
    Uninitialized,
    Running,
    Settled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceNode {
    pub id: DocumentId,
    pub role: NodeRole,
    pub position: Point,
    pub velocity: Point,
    pub radius: f64,
}

/// Point-in-time copy of a simulation, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceLayout {
    pub nodes: Vec<ForceNode>,
    pub edges: Vec<LayoutEdge>,
    pub edge_width: f64,
    pub tick: u32,
    pub state: SimulationState,
}

/// Synchronous force simulation over every document in a graph.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: ForceConfig,
    nodes: Vec<ForceNode>,
    edges: Vec<LayoutEdge>,
    /// Endpoint indices of `edges`, self-loops excluded.
    springs: Vec<(usize, usize)>,
    tick: u32,
    state: SimulationState,
}

impl ForceSimulation {
    /// Collect nodes and resolved edges. Positions stay at the origin until
    /// the first tick (or [`ForceSimulation::initialize`]).
    pub fn new(graph: &Graph, root: &str, config: ForceConfig) -> Self {
        let index: HashMap<&str, usize> = graph
            .ids()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let edges = graph.resolved_edges();
        let mut degree = vec![0usize; index.len()];
        let mut springs = Vec::with_capacity(edges.len());
        for edge in &edges {
            let (source, target) = (index[edge.source.as_str()], index[edge.target.as_str()]);
            degree[source] += 1;
            degree[target] += 1;
            if source != target {
                springs.push((source, target));
            }
        }

        let root_links = graph.get(root);
        let nodes = graph
            .ids()
            .enumerate()
            .map(|(i, id)| ForceNode {
                id: id.clone(),
                role: role_for(root, root_links, id),
                position: Point::default(),
                velocity: Point::default(),
                radius: config.node_radius + 2.0 * (degree[i] as f64).sqrt(),
            })
            .collect();

        Self {
            config,
            nodes,
            edges,
            springs,
            tick: 0,
            state: SimulationState::Uninitialized,
        }
    }

    /// Spread nodes evenly around a circle (radius grows with node count) plus
    /// small random jitter, so pure repulsion never starts from coincident points.
    pub fn initialize(&mut self) {
        if self.state != SimulationState::Uninitialized {
            return;
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n = self.nodes.len();
        let radius = (self.config.rest_length * (n as f64).sqrt() / 2.0).max(MIN_INITIAL_RADIUS);
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let angle = 2.0 * PI * i as f64 / n.max(1) as f64;
            node.position = Point::new(
                radius * angle.cos() + rng.gen_range(-INITIAL_JITTER..=INITIAL_JITTER),
                radius * angle.sin() + rng.gen_range(-INITIAL_JITTER..=INITIAL_JITTER),
            );
            node.velocity = Point::default();
        }

        self.state = SimulationState::Running;
    }

    /// Advance one displayed frame. Returns false once settled.
    pub fn tick(&mut self) -> bool {
        match self.state {
            SimulationState::Settled => return false,
            SimulationState::Uninitialized => self.initialize(),
            SimulationState::Running => {}
        }

        for _ in 0..substeps_for(self.tick) {
            self.step();
        }

        self.tick += 1;
        if self.tick >= self.config.max_ticks {
            self.state = SimulationState::Settled;
        }
        true
    }

    /// Tick until settled.
    pub fn run_to_settled(&mut self) -> ForceLayout {
        while self.tick() {}
        self.snapshot()
    }

    /// One force application + integration over all nodes.
    fn step(&mut self) {
        let n = self.nodes.len();
        let mut forces = vec![Point::default(); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let a = self.nodes[i].position;
                let b = self.nodes[j].position;
                let (dx, dy) = (a.x - b.x, a.y - b.y);
                let dist_sq = dx * dx + dy * dy + MIN_DISTANCE_SQ;
                let dist = dist_sq.sqrt();
                let magnitude = self.config.repulsion / dist_sq;
                let (fx, fy) = (dx / dist * magnitude, dy / dist * magnitude);
                forces[i].x += fx;
                forces[i].y += fy;
                forces[j].x -= fx;
                forces[j].y -= fy;
            }
        }

        for &(source, target) in &self.springs {
            let a = self.nodes[source].position;
            let b = self.nodes[target].position;
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let dist = (dx * dx + dy * dy + MIN_DISTANCE_SQ).sqrt();
            // positive when stretched (pull together), negative when compressed
            let magnitude = self.config.spring_stiffness * (dist - self.config.rest_length);
            let (fx, fy) = (dx / dist * magnitude, dy / dist * magnitude);
            forces[source].x += fx;
            forces[source].y += fy;
            forces[target].x -= fx;
            forces[target].y -= fy;
        }

        for (node, force) in self.nodes.iter_mut().zip(forces.iter_mut()) {
            force.x -= node.position.x * self.config.gravity;
            force.y -= node.position.y * self.config.gravity;

            node.velocity.x = (node.velocity.x + force.x) * self.config.damping;
            node.velocity.y = (node.velocity.y + force.y) * self.config.damping;
            node.position.x += node.velocity.x;
            node.position.y += node.velocity.y;
        }
    }

    pub fn snapshot(&self) -> ForceLayout {
        ForceLayout {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            edge_width: self.config.edge_width,
            tick: self.tick,
            state: self.state,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn nodes(&self) -> &[ForceNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }
}

/// Force sub-steps run in the frame with index `tick`.
pub fn substeps_for(tick: u32) -> u32 {
    if tick < FAST_TICKS {
        FAST_SUBSTEPS
    } else if tick < MEDIUM_TICKS {
        MEDIUM_SUBSTEPS
    } else {
        1
    }
}

fn role_for(root: &str, root_links: Option<&crate::graph::NodeLinks>, id: &str) -> NodeRole {
    if id == root {
        return NodeRole::Root;
    }
    root_links
        .and_then(|links| {
            RelationKind::ALL
                .into_iter()
                .find(|kind| links.targets(*kind).contains(id))
        })
        .map(NodeRole::Linked)
        .unwrap_or(NodeRole::Unlinked)
}
