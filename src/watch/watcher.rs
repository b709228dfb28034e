//! Watcher thread: notify events folded into quiet-period batches.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::error::{NotegraphError, Result};

/// Watch `root` recursively. Paths accepted by `is_document` are collected until
/// no new event has arrived for `debounce_ms`, then sent over `tx` as one batch.
/// Returns when the receiver is dropped or the notify channel closes.
pub fn run_watcher_thread<F>(
    root: &Path,
    debounce_ms: u64,
    is_document: F,
    tx: mpsc::Sender<Vec<PathBuf>>,
) -> Result<()>
where
    F: Fn(&Path) -> bool,
{
    let quiet = Duration::from_millis(debounce_ms.max(1));
    let (event_tx, event_rx) = mpsc::channel::<notify::Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) => {
            let _ = event_tx.send(event);
        }
        Err(e) => log::warn!("watch event error: {}", e),
    })
    .map_err(|e| NotegraphError::Watch(format!("cannot create watcher: {}", e)))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| NotegraphError::Watch(format!("cannot watch {}: {}", root.display(), e)))?;

    let mut batch: BTreeSet<PathBuf> = BTreeSet::new();
    let mut last_event = Instant::now();

    loop {
        match event_rx.recv_timeout(quiet) {
            Ok(event) => {
                if event.kind.is_access() {
                    continue;
                }
                let before = batch.len();
                batch.extend(event.paths.into_iter().filter(|p| is_document(p)));
                if batch.len() != before {
                    last_event = Instant::now();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if batch.is_empty() || last_event.elapsed() < quiet {
                    continue;
                }
                let ready: Vec<PathBuf> = std::mem::take(&mut batch).into_iter().collect();
                if tx.send(ready).is_err() {
                    return Ok(());
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
