//! Compilation domain module.
//!
//! - `outcome`: `RenderedArtifact`, `CompileFailure`, `CompilationOutcome`
//! - `ledger`: sequence-numbered `CompilationRequest`s and the staleness guard
//! - `service`: the `CompilationService` trait for the external backend

mod ledger;
mod outcome;
mod service;

pub use ledger::{CompilationRequest, CompileLedger};
pub use outcome::{CompilationOutcome, CompileFailure, RenderedArtifact};
pub use service::{CompilationService, CompileServiceError};
