//! Infrastructure layer for Quire.
//!
//! Document stores, path resolution and configuration loading.

pub mod config_service;
pub mod dto;
pub mod memory_document_store;
pub mod paths;
pub mod storage;
pub mod toml_document_store;

pub use config_service::ConfigService;
pub use memory_document_store::InMemoryArtifactStore;
pub use paths::{PathError, QuirePaths};
pub use toml_document_store::TomlDirArtifactStore;
