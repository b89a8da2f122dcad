//! Domain layer for Quire.
//!
//! Types and collaborator interfaces shared by every other crate: the
//! document and its store, conversation turns, compilation outcomes and the
//! staleness ledger, the generation and notification capabilities, and the
//! configuration model.

pub mod compile;
pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
pub mod generation;
pub mod notification;
pub mod title;

// Re-export common error type
pub use error::{QuireError, Result};
