use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{DocumentStore, Metadata};
use crate::error::{NotegraphError, Result};
use crate::graph::DocumentId;

#[derive(Debug, Clone)]
struct VaultEntry {
    absolute_path: PathBuf,
    metadata: Metadata,
}

/// A folder of notes on disk.
///
/// Opening the vault walks the root once and caches every document's
/// frontmatter (the metadata cache); bodies are re-read on demand.
#[derive(Debug, Clone)]
pub struct VaultStore {
    entries: BTreeMap<DocumentId, VaultEntry>,
}

impl VaultStore {
    /// Index every file under `root` whose extension is in `extensions`
    /// (case-insensitive, without the leading dot).
    pub fn open(root: &Path, extensions: &[String]) -> Result<Self> {
        if !root.is_dir() {
            return Err(NotegraphError::Config(format!(
                "vault root is not a directory: {}",
                root.display()
            )));
        }

        let mut entries = BTreeMap::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let id = match document_id_for_path(path, root, extensions) {
                Some(id) => id,
                None => continue,
            };

            // An unreadable file is still a document; it just has no metadata.
            let metadata = match std::fs::read_to_string(path) {
                Ok(content) => Metadata::from_document(&content),
                Err(e) => {
                    log::warn!("Cannot read {} while indexing: {}", path.display(), e);
                    Metadata::new()
                }
            };

            let previous = entries.insert(
                id.clone(),
                VaultEntry {
                    absolute_path: path.to_path_buf(),
                    metadata,
                },
            );
            if let Some(previous) = previous {
                log::warn!(
                    "Duplicate document id {} ({} replaced by {})",
                    id,
                    previous.absolute_path.display(),
                    path.display()
                );
            }
        }

        log::info!("Indexed {} documents in {}", entries.len(), root.display());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DocumentStore for VaultStore {
    fn list(&self) -> Vec<DocumentId> {
        self.entries.keys().cloned().collect()
    }

    fn metadata(&self, id: &str) -> Option<Metadata> {
        self.entries.get(id).map(|e| e.metadata.clone())
    }

    fn read_body(&self, id: &str) -> Result<String> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| NotegraphError::DocumentNotFound(id.to_string()))?;
        std::fs::read_to_string(&entry.absolute_path).map_err(NotegraphError::Io)
    }
}

/// Derive the document identifier for a path under `root`: the relative path
/// with `/` separators and without its extension (`Projects/Plan.md` ->
/// `Projects/Plan`).
///
/// Returns None if the path is outside root or has an extension not in `extensions`.
/// The file itself does not have to exist, so removed files still map to an id.
pub fn document_id_for_path(path: &Path, root: &Path, extensions: &[String]) -> Option<DocumentId> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&extension)) {
        return None;
    }

    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            // notify reports canonical paths; the configured root may not be.
            let root = root.canonicalize().ok()?;
            path.strip_prefix(&root).ok()?.to_path_buf()
        }
    };

    let id = relative
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/");

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn md() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn test_vault_open_indexes_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("Projects/sub")).unwrap();
        fs::write(root.join("index.md"), "---\nleadsto: Projects/Plan\n---\n# Index").unwrap();
        fs::write(root.join("Projects/Plan.md"), "# Plan\nleadsto@\"Projects/sub/Task\"").unwrap();
        fs::write(root.join("Projects/sub/Task.MD"), "task").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let store = VaultStore::open(root, &md()).unwrap();
        assert_eq!(
            store.list(),
            vec!["Projects/Plan", "Projects/sub/Task", "index"]
        );
        let meta = store.metadata("index").unwrap();
        assert!(meta.get("leadsto").is_some());
        assert!(store.read_body("Projects/Plan").unwrap().contains("leadsto@"));
    }

    #[test]
    fn test_vault_open_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            VaultStore::open(&missing, &md()),
            Err(NotegraphError::Config(_))
        ));
    }

    #[test]
    fn test_vault_read_body_after_delete_is_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.md"), "text").unwrap();
        let store = VaultStore::open(temp_dir.path(), &md()).unwrap();
        fs::remove_file(temp_dir.path().join("a.md")).unwrap();
        assert!(matches!(store.read_body("a"), Err(NotegraphError::Io(_))));
    }

    #[test]
    fn test_document_id_for_path() {
        let root = Path::new("/vault");
        assert_eq!(
            document_id_for_path(Path::new("/vault/Projects/Plan.md"), root, &md()),
            Some("Projects/Plan".to_string())
        );
        assert_eq!(
            document_id_for_path(Path::new("/vault/readme.txt"), root, &md()),
            None
        );
        assert_eq!(
            document_id_for_path(Path::new("/elsewhere/a.md"), root, &md()),
            None
        );
    }
}
