//! Generation service trait.
//!
//! The AI call that turns an instruction into LaTeX is an external
//! collaborator; the session only sees this interface.

use crate::conversation::ConversationTurn;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document body produced by the generation service, plus the message
/// shown in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    /// LaTeX source
    pub body: String,
    /// Human-readable explanation for the assistant turn
    pub explanation: String,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produces a first document from the instruction alone.
    ///
    /// # Errors
    ///
    /// Returns `QuireError::Generation` when the upstream call fails.
    async fn generate_initial(&self, instruction: &str) -> Result<GeneratedDocument>;

    /// Revises `body` given the full history (which already ends with the
    /// user turn carrying `instruction`).
    ///
    /// # Errors
    ///
    /// Returns `QuireError::Generation` when the upstream call fails.
    async fn refine(
        &self,
        body: &str,
        history: &[ConversationTurn],
        instruction: &str,
    ) -> Result<GeneratedDocument>;
}
