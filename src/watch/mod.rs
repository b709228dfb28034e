//! Refresh-on-change: rebuild the whole graph whenever documents under the
//! vault root change.
//!
//! There is no incremental update; each batch of changes triggers a fresh
//! index + build, and the previous graph is simply replaced.

mod watcher;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::Result;
use crate::graph::{build_graph, Graph, GraphStats};
use crate::store::{document_id_for_path, VaultStore};

/// Identifiers of the documents named by a batch of changed paths.
pub fn changed_documents(paths: &[PathBuf], root: &Path, extensions: &[String]) -> Vec<String> {
    let mut ids: Vec<String> = paths
        .iter()
        .filter_map(|p| document_id_for_path(p, root, extensions))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Re-index the vault and rebuild the graph with the configured passes.
pub fn refresh_graph(config: &Config) -> Result<Graph> {
    let store = VaultStore::open(config.vault_root(), &config.vault.extensions)?;
    Ok(build_graph(&store, &config.graph))
}

/// Run the watcher until its thread exits. `on_refresh` receives the stats of
/// every rebuilt graph.
pub async fn run_watcher<F>(config: Config, debounce_ms: u64, mut on_refresh: F) -> Result<()>
where
    F: FnMut(&GraphStats),
{
    let root = config.vault_root().to_path_buf();
    let extensions = config.vault.extensions.clone();
    let (tx, rx) = mpsc::channel();
    let rx = Arc::new(Mutex::new(rx));

    {
        let root = root.clone();
        let extensions = extensions.clone();
        std::thread::spawn(move || {
            let filter_root = root.clone();
            let is_document = move |p: &Path| document_id_for_path(p, &filter_root, &extensions).is_some();
            if let Err(e) = watcher::run_watcher_thread(&root, debounce_ms, is_document, tx) {
                log::error!("watcher thread error: {}", e);
            }
        });
    }

    let config = Arc::new(config);
    let initial = refresh_on_blocking(Arc::clone(&config)).await?;
    on_refresh(&initial.stats());

    loop {
        let rx_clone = rx.clone();
        let batch = tokio::task::spawn_blocking(move || rx_clone.lock().unwrap().recv()).await?;

        let batch = match batch {
            Ok(batch) => batch,
            Err(_) => break,
        };

        let changed = changed_documents(&batch, &root, &extensions);
        log::info!("watch: {} changed ({})", changed.len(), changed.join(", "));

        match refresh_on_blocking(Arc::clone(&config)).await {
            Ok(graph) => on_refresh(&graph.stats()),
            Err(e) => log::error!("watch refresh failed: {}", e),
        }
    }
    Ok(())
}

async fn refresh_on_blocking(config: Arc<Config>) -> Result<Graph> {
    tokio::task::spawn_blocking(move || refresh_graph(&config)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpServerConfig, VaultConfig};
    use crate::graph::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn md() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn test_changed_documents_filters_and_dedupes() {
        let root = Path::new("/vault");
        let paths = vec![
            PathBuf::from("/vault/b.md"),
            PathBuf::from("/vault/notes/a.md"),
            PathBuf::from("/vault/b.md"),
            PathBuf::from("/vault/.obsidian/workspace.json"),
            PathBuf::from("/other/c.md"),
        ];
        assert_eq!(changed_documents(&paths, root, &md()), vec!["b", "notes/a"]);
    }

    #[test]
    fn test_refresh_graph_sees_new_documents() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.md"), ">@b").unwrap();
        let config = Config {
            vault: VaultConfig {
                root: temp_dir.path().to_path_buf(),
                extensions: md(),
            },
            graph: BuildOptions {
                infer: true,
                reduce: false,
            },
            tree: Default::default(),
            force: Default::default(),
            http_server: HttpServerConfig::default(),
        };

        let first = refresh_graph(&config).unwrap();
        assert_eq!(first.stats().dangling, 1);

        fs::write(temp_dir.path().join("b.md"), "").unwrap();
        let second = refresh_graph(&config).unwrap();
        assert_eq!(second.stats().dangling, 0);
        assert_eq!(second.get("b").unwrap().depends_on.to_vec(), vec!["a"]);
    }
}
