//! Document domain module.
//!
//! - `model`: the `Document` entity and its listing summary
//! - `repository`: the `ArtifactStore` persistence trait

mod model;
mod repository;

pub use model::{Document, DocumentSummary};
pub use repository::ArtifactStore;
