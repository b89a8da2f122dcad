//! Conversation turn types.
//!
//! This module contains types for representing the exchanges of a
//! refinement conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Instruction from the user.
    User,
    /// Reply from the generation service (or a synthetic error reply).
    Assistant,
}

impl TurnRole {
    /// Label used when rendering a transcript.
    pub fn label(self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        }
    }
}

/// A single exchange in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// The role of the turn's author.
    pub role: TurnRole,
    /// The message text.
    pub message: String,
    /// When the turn was appended.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(TurnRole::User, message)
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, message)
    }

    fn new(role: TurnRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Renders turns as a plain `Role: message` transcript.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.message))
        .collect::<Vec<_>>()
        .join("\n")
}
