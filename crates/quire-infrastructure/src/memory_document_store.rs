//! In-memory `ArtifactStore`, for tests and sessions that should leave no
//! trace on disk.

use crate::dto::{DocumentRecord, sort_newest_first};
use async_trait::async_trait;
use quire_core::document::{ArtifactStore, Document, DocumentSummary};
use quire_core::error::{QuireError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryArtifactStore {
    records: RwLock<HashMap<String, DocumentRecord>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn create(&self, owner: &str, title: &str, source: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let record = DocumentRecord::new(id.clone(), owner, title, source);
        self.records.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn update(&self, owner: &str, id: &str, source: &str) -> Result<()> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) if record.is_owned_by(owner) => {
                record.set_source(source);
                Ok(())
            }
            _ => Err(QuireError::not_found("document", id)),
        }
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .filter(|record| record.is_owned_by(owner))
            .cloned()
            .map(Document::from))
    }

    async fn list(&self, owner: &str) -> Result<Vec<DocumentSummary>> {
        let mut summaries: Vec<DocumentSummary> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.is_owned_by(owner))
            .map(DocumentRecord::summary)
            .collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        if !records.get(id).is_some_and(|record| record.is_owned_by(owner)) {
            return Err(QuireError::not_found("document", id));
        }
        records.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_scoped_by_owner() {
        let store = InMemoryArtifactStore::new();
        let id = store.create("alice", "Tides", "v1").await.unwrap();

        store.update("alice", &id, "v2").await.unwrap();
        assert_eq!(store.get("alice", &id).await.unwrap().unwrap().source, "v2");
        assert!(store.get("bob", &id).await.unwrap().is_none());
        assert_eq!(store.list("alice").await.unwrap().len(), 1);

        assert!(store.delete("bob", &id).await.unwrap_err().is_not_found());
        store.delete("alice", &id).await.unwrap();
        assert!(store.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let store = InMemoryArtifactStore::new();
        let err = store.update("alice", "missing", "x").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
