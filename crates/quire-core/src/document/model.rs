//! Document domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The LaTeX document a session is working on.
///
/// `id` is `None` until the document has been stored for the first time.
/// The stored copy is only the last-synced snapshot; the session that holds
/// a `Document` owns the live body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier (UUID format), absent for unsaved documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title
    pub title: String,
    /// The LaTeX source
    pub source: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates an unsaved, untitled document with the given source.
    pub fn unsaved(source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: String::new(),
            source: source.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an empty unsaved document.
    pub fn empty() -> Self {
        Self::unsaved(String::new())
    }

    /// Returns true once the document has a store identity.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Returns true if there is no source text yet.
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Builds the listing entry for a stored document.
    pub fn summary(&self) -> Option<DocumentSummary> {
        self.id.as_ref().map(|id| DocumentSummary {
            id: id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Replaces the source and bumps `updated_at`.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.updated_at = Utc::now();
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

/// Listing entry returned by [`super::ArtifactStore::list`].
///
/// The source text is omitted; listing only needs to render a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
