//! Directory-of-TOML-files `ArtifactStore` implementation.

use crate::dto::{DocumentRecord, sort_newest_first};
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use quire_core::document::{ArtifactStore, Document, DocumentSummary};
use quire_core::error::{QuireError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

const ENTITY_NAME: &str = "document";

/// File-backed document store.
///
/// Directory structure:
/// ```text
/// documents/
/// ├── 6f1c…-uuid-1.toml
/// └── 0a9e…-uuid-2.toml
/// ```
///
/// `update` and `delete` read, modify and rewrite a file, so they hold a
/// per-document lock for the whole cycle. Overlapping saves of one document
/// (a session's consecutive compiles, or two sessions on the same id) run
/// one after the other.
pub struct TomlDirArtifactStore {
    dir: PathBuf,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TomlDirArtifactStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| QuireError::io(format!("Failed to create document storage: {}", e)))?;
        Ok(Self {
            dir,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    async fn lock_document(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.write_locks.lock().await;
            locks.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Ids become file names, so anything that is not a plain name is
    /// treated as an unknown document.
    fn file_for(&self, id: &str) -> Option<AtomicTomlFile<DocumentRecord>> {
        let plain = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        plain.then(|| AtomicTomlFile::new(self.dir.join(format!("{id}.toml"))))
    }

    async fn load_owned(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<Option<(AtomicTomlFile<DocumentRecord>, DocumentRecord)>> {
        let Some(file) = self.file_for(id) else {
            return Ok(None);
        };
        let record = file
            .load()
            .await
            .map_err(|e| QuireError::persistence(format!("Failed to load document {id}: {e}")))?;
        Ok(record
            .filter(|record| record.is_owned_by(owner))
            .map(|record| (file, record)))
    }
}

#[async_trait]
impl ArtifactStore for TomlDirArtifactStore {
    async fn create(&self, owner: &str, title: &str, source: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let record = DocumentRecord::new(id.clone(), owner, title, source);
        let file = AtomicTomlFile::new(self.dir.join(format!("{id}.toml")));
        file.save(&record)
            .await
            .map_err(|e| QuireError::persistence(format!("Failed to create document: {}", e)))?;
        tracing::debug!(document_id = %id, "Document file written");
        Ok(id)
    }

    async fn update(&self, owner: &str, id: &str, source: &str) -> Result<()> {
        let _write = self.lock_document(id).await;
        let (file, mut record) = self
            .load_owned(owner, id)
            .await?
            .ok_or_else(|| QuireError::not_found(ENTITY_NAME, id))?;
        record.set_source(source);
        file.save(&record)
            .await
            .map_err(|e| QuireError::persistence(format!("Failed to update document: {}", e)))
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .load_owned(owner, id)
            .await?
            .map(|(_, record)| record.into()))
    }

    async fn list(&self, owner: &str) -> Result<Vec<DocumentSummary>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| QuireError::persistence(format!("Failed to list documents: {}", e)))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path.extension().is_some_and(|ext| ext == "toml")
                && !path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            if !is_document {
                continue;
            }

            match AtomicTomlFile::<DocumentRecord>::new(path.clone()).load().await {
                Ok(Some(record)) if record.is_owned_by(owner) => summaries.push(record.summary()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable document file"
                    );
                }
            }
        }

        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let _write = self.lock_document(id).await;
        let (file, _) = self
            .load_owned(owner, id)
            .await?
            .ok_or_else(|| QuireError::not_found(ENTITY_NAME, id))?;
        file.remove()
            .await
            .map_err(|e| QuireError::persistence(format!("Failed to delete document: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (TomlDirArtifactStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlDirArtifactStore::new(documents_dir(&temp_dir))
            .await
            .unwrap();
        (store, temp_dir)
    }

    fn documents_dir(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("documents")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (store, temp_dir) = create_test_store().await;

        let id = store
            .create("alice", "Tides", "\\section{Tides}")
            .await
            .unwrap();

        let document = store.get("alice", &id).await.unwrap().unwrap();
        assert_eq!(document.id.as_deref(), Some(id.as_str()));
        assert_eq!(document.title, "Tides");
        assert_eq!(document.source, "\\section{Tides}");
        assert!(documents_dir(&temp_dir).join(format!("{id}.toml")).exists());
    }

    #[tokio::test]
    async fn test_update_replaces_source() {
        let (store, _temp_dir) = create_test_store().await;
        let id = store.create("alice", "Tides", "v1").await.unwrap();

        store.update("alice", &id, "v2").await.unwrap();

        let document = store.get("alice", &id).await.unwrap().unwrap();
        assert_eq!(document.source, "v2");
        assert!(document.updated_at >= document.created_at);
    }

    #[tokio::test]
    async fn test_other_owner_sees_nothing() {
        let (store, _temp_dir) = create_test_store().await;
        let id = store.create("alice", "Tides", "v1").await.unwrap();

        assert!(store.get("bob", &id).await.unwrap().is_none());
        assert!(store.update("bob", &id, "hijack").await.unwrap_err().is_not_found());
        assert!(store.delete("bob", &id).await.unwrap_err().is_not_found());
        assert!(store.list("bob").await.unwrap().is_empty());
        assert_eq!(store.get("alice", &id).await.unwrap().unwrap().source, "v1");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_skips_junk() {
        let (store, temp_dir) = create_test_store().await;
        let first = store.create("alice", "First", "a").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create("alice", "Second", "b").await.unwrap();
        std::fs::write(documents_dir(&temp_dir).join("broken.toml"), "not = [valid").unwrap();
        std::fs::write(documents_dir(&temp_dir).join("notes.txt"), "ignored").unwrap();

        let listed: Vec<String> = store
            .list("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|summary| summary.id)
            .collect();

        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let (store, _temp_dir) = create_test_store().await;
        let id = store.create("alice", "Tides", "v1").await.unwrap();

        store.delete("alice", &id).await.unwrap();

        assert!(store.get("alice", &id).await.unwrap().is_none());
        assert!(store.delete("alice", &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_path_like_ids_are_unknown() {
        let (store, _temp_dir) = create_test_store().await;

        assert!(store.get("alice", "../config").await.unwrap().is_none());
        assert!(store.update("alice", "a/b", "x").await.unwrap_err().is_not_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_updates_never_fail_or_corrupt() {
        let (store, temp_dir) = create_test_store().await;
        let store = Arc::new(store);
        let id = store.create("local", "Tides", "v0").await.unwrap();

        for round in 0..100 {
            let writers: Vec<_> = ["left", "right"]
                .into_iter()
                .map(|side| {
                    let store = store.clone();
                    let id = id.clone();
                    tokio::spawn(async move {
                        store
                            .update("local", &id, &format!("{side}-{round}"))
                            .await
                    })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let stored = store.get("local", &id).await.unwrap().unwrap().source;
            assert!(
                stored == format!("left-{round}") || stored == format!("right-{round}"),
                "round {round} stored {stored:?}"
            );
        }

        let leftovers: Vec<_> = std::fs::read_dir(documents_dir(&temp_dir))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }
}
