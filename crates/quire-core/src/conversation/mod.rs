//! Conversation domain module.

mod message;

pub use message::{ConversationTurn, TurnRole, render_transcript};
