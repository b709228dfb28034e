//! Graph assembly: extract every document's links and key them by identifier.

use rayon::prelude::*;
use serde::Deserialize;

use super::{extract_links, infer_bidirectional, transitive_reduction, DocumentId, Graph, NodeLinks};
use crate::store::DocumentStore;

/// Which inference passes to run after assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BuildOptions {
    /// Add inverse `LeadsTo`/`DependsOn` edges (in memory only).
    #[serde(default)]
    pub infer: bool,
    /// Drop `LeadsTo` edges implied by a longer `LeadsTo` path.
    #[serde(default)]
    pub reduce: bool,
}

/// Extract one document's links. An unreadable body falls back to
/// metadata-only extraction.
pub fn extract_document<S: DocumentStore + ?Sized>(store: &S, id: &str) -> NodeLinks {
    let metadata = store.metadata(id).unwrap_or_default();
    match store.read_body(id) {
        Ok(body) => extract_links(&metadata, Some(&body)),
        Err(e) => {
            log::warn!("Cannot read {}, using metadata links only: {}", id, e);
            extract_links(&metadata, None)
        }
    }
}

/// Build the full graph from a store.
///
/// Extraction runs in parallel (each document only produces its own entry);
/// the inference passes then run single-threaded over the assembled graph,
/// bidirectional inference first.
pub fn build_graph<S: DocumentStore + ?Sized>(store: &S, options: &BuildOptions) -> Graph {
    let start = std::time::Instant::now();
    let ids = store.list();

    let extracted: Vec<(DocumentId, NodeLinks)> = ids
        .par_iter()
        .map(|id| {
            let links = extract_document(store, id);
            log::debug!("extracted {} links from {}", links.degree(), id);
            (id.clone(), links)
        })
        .collect();

    let mut graph = Graph::new();
    for (id, links) in extracted {
        if graph.insert(id.clone(), links).is_some() {
            log::warn!("Duplicate document id {}, keeping the last one", id);
        }
    }

    if options.infer {
        graph = infer_bidirectional(&graph);
    }
    if options.reduce {
        graph = transitive_reduction(&graph);
    }

    log::info!(
        "Built graph (infer={}, reduce={}): {} in {:?}",
        options.infer,
        options.reduce,
        graph.stats(),
        start.elapsed()
    );
    graph
}
