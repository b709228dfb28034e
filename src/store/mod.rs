//! Document-store collaborators.
//!
//! The graph builder only needs three things from a store: the list of
//! identifiers, per-document metadata, and the raw body text (which may fail to
//! read). [`VaultStore`] serves a folder of notes from disk, [`MemoryStore`]
//! serves documents registered in memory.

pub mod metadata;
pub mod vault;

pub use metadata::{split_frontmatter, strip_frontmatter, MetaValue, Metadata};
pub use vault::{document_id_for_path, VaultStore};

use std::collections::BTreeMap;

use crate::error::{NotegraphError, Result};
use crate::graph::DocumentId;

/// Source of documents for a graph build. Implementations must be shareable
/// across threads because extraction runs in parallel.
pub trait DocumentStore: Sync {
    /// All document identifiers known to the store.
    fn list(&self) -> Vec<DocumentId>;

    /// Cached structured metadata for a document.
    fn metadata(&self, id: &str) -> Option<Metadata>;

    /// Raw text of a document, frontmatter included.
    fn read_body(&self, id: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
struct MemoryDocument {
    metadata: Metadata,
    body: Option<String>,
}

/// In-memory store, mostly for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<DocumentId, MemoryDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document from its full text; frontmatter becomes its metadata.
    pub fn add_markdown(&mut self, id: impl Into<DocumentId>, content: impl Into<String>) {
        let content = content.into();
        let metadata = Metadata::from_document(&content);
        self.documents.insert(
            id.into(),
            MemoryDocument {
                metadata,
                body: Some(content),
            },
        );
    }

    /// Register a document whose body cannot be read.
    pub fn add_unreadable(&mut self, id: impl Into<DocumentId>, metadata: Metadata) {
        self.documents
            .insert(id.into(), MemoryDocument { metadata, body: None });
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self) -> Vec<DocumentId> {
        self.documents.keys().cloned().collect()
    }

    fn metadata(&self, id: &str) -> Option<Metadata> {
        self.documents.get(id).map(|doc| doc.metadata.clone())
    }

    fn read_body(&self, id: &str) -> Result<String> {
        match self.documents.get(id) {
            Some(MemoryDocument { body: Some(body), .. }) => Ok(body.clone()),
            Some(_) => Err(NotegraphError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("body of {} is not readable", id),
            ))),
            None => Err(NotegraphError::DocumentNotFound(id.to_string())),
        }
    }
}
