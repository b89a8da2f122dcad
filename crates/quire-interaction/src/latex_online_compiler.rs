//! Compilation through a LaTeX-Online style sync build endpoint.
//!
//! `GET <endpoint>?content=<source>` answers with the PDF bytes on success
//! and an error status otherwise. One call is one attempt; retrying is the
//! caller's business.

use async_trait::async_trait;
use quire_core::compile::{CompilationService, CompileServiceError, RenderedArtifact};
use quire_core::config::{CompileConfig, DEFAULT_COMPILE_ENDPOINT};
use quire_core::error::{QuireError, Result};
use reqwest::{Client, StatusCode};

#[derive(Clone)]
pub struct LatexOnlineCompiler {
    client: Client,
    endpoint: String,
}

impl LatexOnlineCompiler {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Builds a compiler from the `[compile]` section, applying its request
    /// timeout when set.
    ///
    /// # Errors
    ///
    /// Returns `QuireError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &CompileConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| QuireError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for LatexOnlineCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILE_ENDPOINT)
    }
}

#[async_trait]
impl CompilationService for LatexOnlineCompiler {
    async fn compile(&self, source: &str) -> std::result::Result<RenderedArtifact, CompileServiceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("content", source)])
            .send()
            .await
            .map_err(|err| CompileServiceError::transport(format!("Compile request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_http_error(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| CompileServiceError::transport(format!("Failed to read compiled PDF: {err}")))?;
        if bytes.is_empty() {
            return Err(CompileServiceError::http(
                status.as_u16(),
                "Compilation service returned an empty PDF",
            ));
        }

        tracing::debug!(bytes = bytes.len(), "Received compiled PDF");
        Ok(RenderedArtifact::from_pdf_bytes(&bytes))
    }
}

fn map_http_error(status: StatusCode) -> CompileServiceError {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    CompileServiceError::http(status.as_u16(), format!("Compilation failed: {reason}"))
}
