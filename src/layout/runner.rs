//! Mounted force layout: drives a [`ForceSimulation`] frame by frame on the
//! tokio runtime and publishes snapshots for a renderer.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use super::force::{ForceConfig, ForceLayout, ForceSimulation, SimulationState};
use crate::error::{NotegraphError, Result};
use crate::graph::Graph;

/// Pan/zoom transform of the view. Independent of the physics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
        }
    }
}

struct Shared {
    stopped: AtomicBool,
    layout: Mutex<ForceLayout>,
    viewport: Mutex<Viewport>,
}

/// Handle to a running (or settled) force layout.
///
/// Dropping the handle does not stop the simulation; call [`ForceLayoutHandle::stop`].
pub struct ForceLayoutHandle {
    shared: Arc<Shared>,
    /// Flips to true once the frame loop has exited.
    finished: watch::Receiver<bool>,
}

/// Mount a force layout over the whole graph and start ticking it.
///
/// Must be called from within a tokio runtime. `prior_viewport` restores the
/// pan/zoom of a previous mount.
pub fn mount_force_layout(
    graph: &Graph,
    root: &str,
    config: ForceConfig,
    prior_viewport: Option<Viewport>,
) -> Result<ForceLayoutHandle> {
    if !graph.contains(root) {
        return Err(NotegraphError::DocumentNotFound(root.to_string()));
    }

    let frame_interval = Duration::from_millis(config.frame_interval_ms);
    let simulation = ForceSimulation::new(graph, root, config);
    let shared = Arc::new(Shared {
        stopped: AtomicBool::new(false),
        layout: Mutex::new(simulation.snapshot()),
        viewport: Mutex::new(prior_viewport.unwrap_or_default()),
    });

    log::debug!(
        "mounting force layout for {} ({} nodes, {} edges)",
        root,
        simulation.nodes().len(),
        simulation.edges().len()
    );

    let (finished_tx, finished) = watch::channel(false);
    let frames = run_frames(simulation, Arc::clone(&shared), frame_interval);
    tokio::spawn(async move {
        frames.await;
        // a panicking loop drops the sender instead, which also wakes waiters
        let _ = finished_tx.send(true);
    });

    Ok(ForceLayoutHandle { shared, finished })
}

/// Frame loop. A frame always completes before the stop flag is checked again,
/// so positions are never observed half-updated.
async fn run_frames(mut simulation: ForceSimulation, shared: Arc<Shared>, frame_interval: Duration) {
    loop {
        if shared.stopped.load(Ordering::SeqCst) {
            log::debug!("force layout stopped at tick {}", simulation.tick_count());
            return;
        }

        if !simulation.tick() {
            return;
        }
        *shared.layout.lock().unwrap() = simulation.snapshot();

        if simulation.state() == SimulationState::Settled {
            log::debug!("force layout settled after {} ticks", simulation.tick_count());
            return;
        }

        if frame_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(frame_interval).await;
        }
    }
}

impl ForceLayoutHandle {
    /// Halt further frames. Idempotent, and safe before the first frame runs.
    pub fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn is_settled(&self) -> bool {
        self.shared.layout.lock().unwrap().state == SimulationState::Settled
    }

    /// Latest published frame.
    pub fn snapshot(&self) -> ForceLayout {
        self.shared.layout.lock().unwrap().clone()
    }

    pub fn viewport(&self) -> Viewport {
        *self.shared.viewport.lock().unwrap()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        *self.shared.viewport.lock().unwrap() = viewport;
    }

    /// Wait until the frame loop has exited (settled or stopped) and return
    /// the final snapshot. Any number of callers may wait at once.
    pub async fn settled(&self) -> ForceLayout {
        let mut finished = self.finished.clone();
        if finished.wait_for(|done| *done).await.is_err() {
            log::error!("force layout task ended without finishing");
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeLinks, RelationKind};

    fn graph() -> Graph {
        let mut graph = Graph::new();
        let mut a = NodeLinks::new();
        a.insert(RelationKind::LeadsTo, "b");
        a.insert(RelationKind::DependsOn, "c");
        graph.insert("a", a);
        graph.insert("b", NodeLinks::new());
        graph.insert("c", NodeLinks::new());
        graph
    }

    fn fast_config(max_ticks: u32) -> ForceConfig {
        ForceConfig {
            max_ticks,
            frame_interval_ms: 0,
            seed: Some(42),
            ..ForceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_runs_until_settled() {
        let handle = mount_force_layout(&graph(), "a", fast_config(40), None).unwrap();
        let layout = handle.settled().await;
        assert_eq!(layout.state, SimulationState::Settled);
        assert_eq!(layout.tick, 40);
        assert!(handle.is_settled());
    }

    #[tokio::test]
    async fn test_concurrent_waiters_see_final_frame() {
        let handle = mount_force_layout(&graph(), "a", fast_config(50), None).unwrap();
        let (first, second) = tokio::join!(handle.settled(), handle.settled());
        assert_eq!(first.tick, 50);
        assert_eq!(first.state, SimulationState::Settled);
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiters_on_other_tasks() {
        let handle = Arc::new(mount_force_layout(&graph(), "a", fast_config(80), None).unwrap());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let handle = Arc::clone(&handle);
                tokio::spawn(async move { handle.settled().await })
            })
            .collect();
        for waiter in waiters {
            let layout = waiter.await.unwrap();
            assert_eq!(layout.tick, 80);
            assert_eq!(layout.state, SimulationState::Settled);
        }
    }

    #[tokio::test]
    async fn test_stop_after_settle_is_idempotent() {
        let handle = mount_force_layout(&graph(), "a", fast_config(20), None).unwrap();
        let settled = handle.settled().await;
        handle.stop();
        handle.stop();
        tokio::task::yield_now().await;
        assert_eq!(handle.snapshot(), settled);
        assert_eq!(handle.settled().await, settled);
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_before_first_tick() {
        let handle = mount_force_layout(&graph(), "a", fast_config(1_000), None).unwrap();
        // current-thread runtime: the frame task has not been polled yet
        handle.stop();
        let layout = handle.settled().await;
        assert_eq!(layout.tick, 0);
        assert_eq!(layout.state, SimulationState::Uninitialized);
    }

    #[tokio::test]
    async fn test_stop_midway_halts_frames() {
        let handle = mount_force_layout(&graph(), "a", fast_config(100_000), None).unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        handle.stop();
        let stopped = handle.settled().await;
        assert!(stopped.tick < 100_000);
        assert_ne!(stopped.state, SimulationState::Settled);
        tokio::task::yield_now().await;
        assert_eq!(handle.snapshot(), stopped);
    }

    #[tokio::test]
    async fn test_viewport_restored_and_independent() {
        let prior = Viewport {
            translate_x: 12.0,
            translate_y: -4.0,
            scale: 2.5,
        };
        let handle = mount_force_layout(&graph(), "a", fast_config(10), Some(prior)).unwrap();
        assert_eq!(handle.viewport(), prior);
        handle.settled().await;
        assert_eq!(handle.viewport(), prior);

        let moved = Viewport {
            scale: 0.5,
            ..prior
        };
        handle.set_viewport(moved);
        assert_eq!(handle.viewport(), moved);

        let fresh = mount_force_layout(&graph(), "a", fast_config(10), None).unwrap();
        fresh.stop();
        assert_eq!(fresh.viewport(), Viewport::default());
    }

    #[tokio::test]
    async fn test_unknown_root() {
        let result = mount_force_layout(&graph(), "zzz", fast_config(10), None);
        assert!(matches!(result, Err(NotegraphError::DocumentNotFound(_))));
    }
}
