//! Compilation service trait.

use super::outcome::RenderedArtifact;
use async_trait::async_trait;

/// A single failed call to the compilation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileServiceError {
    /// HTTP status when the backend answered, `None` for transport failures
    pub status: Option<u16>,
    pub message: String,
}

impl CompileServiceError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CompileServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "HTTP {code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CompileServiceError {}

/// The external LaTeX → PDF backend.
///
/// Assumed slow, rate-limited and intermittently unavailable. Callers must
/// not rely on idempotency beyond identical input giving identical output.
#[async_trait]
pub trait CompilationService: Send + Sync {
    async fn compile(&self, source: &str) -> Result<RenderedArtifact, CompileServiceError>;
}
