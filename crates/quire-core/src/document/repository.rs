//! Artifact store trait.
//!
//! Defines the interface for document persistence operations.

use super::model::{Document, DocumentSummary};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract keyed record store for documents.
///
/// Every operation is scoped to an owner. A record that exists but belongs
/// to another owner is reported exactly like a missing one.
///
/// Writes are last-writer-wins; there is no optimistic concurrency token.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Creates a new document record.
    ///
    /// # Returns
    ///
    /// - `Ok(id)`: The identifier assigned by the store
    /// - `Err(_)`: Store unreachable or write rejected
    async fn create(&self, owner: &str, title: &str, source: &str) -> Result<String>;

    /// Replaces the stored source of an existing document.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Source updated
    /// - `Err(QuireError::NotFound)`: No such document for this owner
    async fn update(&self, owner: &str, id: &str, source: &str) -> Result<()>;

    /// Finds a document by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Document))`: Document found
    /// - `Ok(None)`: Document not found (or owned by someone else)
    async fn get(&self, owner: &str, id: &str) -> Result<Option<Document>>;

    /// Lists the owner's documents, newest first.
    async fn list(&self, owner: &str) -> Result<Vec<DocumentSummary>>;

    /// Deletes a document.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Document deleted
    /// - `Err(QuireError::NotFound)`: No such document for this owner
    async fn delete(&self, owner: &str, id: &str) -> Result<()>;
}
