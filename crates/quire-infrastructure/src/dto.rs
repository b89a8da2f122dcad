//! On-disk representation of stored documents.

use chrono::{DateTime, Utc};
use quire_core::document::{Document, DocumentSummary};
use serde::{Deserialize, Serialize};

/// A document record as written to `<id>.toml`.
///
/// Carries the owner next to the document so every store operation can
/// check ownership without an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl DocumentRecord {
    pub fn new(id: String, owner: &str, title: &str, source: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner: owner.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            source: source.to_string(),
        }
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }

    pub fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Document {
            id: Some(record.id),
            title: record.title,
            source: record.source,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Newest first, as listings are shown.
pub(crate) fn sort_newest_first(summaries: &mut [DocumentSummary]) {
    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
