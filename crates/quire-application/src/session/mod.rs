//! Refinement sessions.
//!
//! A session owns one document, the conversation that shaped it, and the
//! compile state shown next to it.

mod compiler;
mod refinement;
mod state;

pub use refinement::{RefinementSession, SessionOptions, SessionServices};
pub use state::{SessionPhase, SessionSnapshot};
