//! Compilation results.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Opaque reference to a rendered PDF.
///
/// The HTTP compiler produces inline `data:` URLs; other services may hand
/// back any URL. Equality is by reference string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedArtifact(String);

impl RenderedArtifact {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Wraps raw PDF bytes into an inline data URL reference.
    pub fn from_pdf_bytes(bytes: &[u8]) -> Self {
        Self(format!(
            "{PDF_DATA_URL_PREFIX}{}",
            BASE64_STANDARD.encode(bytes)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty reference is never a usable artifact.
    pub fn is_usable(&self) -> bool {
        !self.0.trim().is_empty()
    }

    /// Decodes the PDF bytes when the reference is an inline data URL.
    pub fn pdf_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.0.strip_prefix(PDF_DATA_URL_PREFIX)?;
        BASE64_STANDARD.decode(encoded).ok()
    }
}

impl std::fmt::Display for RenderedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // data URLs run to megabytes
        if self.0.len() > 64 {
            let head: String = self.0.chars().take(48).collect();
            write!(f, "{head}… ({} bytes)", self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Why a compilation produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileFailure {
    /// Another compile is in flight on the same client; re-issue later.
    Busy,
    /// One attempt failed. Retried inside the client and never returned by it.
    Transient { message: String },
    /// Every attempt failed.
    Terminal { attempts: u32, message: String },
}

impl CompileFailure {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "Compilation already in progress"),
            Self::Transient { message } => write!(f, "Compile attempt failed: {message}"),
            Self::Terminal { attempts, message } => {
                write!(f, "Compilation failed after {attempts} attempts: {message}")
            }
        }
    }
}

/// Result of turning a source snapshot into a rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum CompilationOutcome {
    Rendered(RenderedArtifact),
    Failed(CompileFailure),
}

impl CompilationOutcome {
    pub fn busy() -> Self {
        Self::Failed(CompileFailure::Busy)
    }

    pub fn artifact(&self) -> Option<&RenderedArtifact> {
        match self {
            Self::Rendered(artifact) => Some(artifact),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CompileFailure> {
        match self {
            Self::Rendered(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Failed(CompileFailure::Busy))
    }
}
