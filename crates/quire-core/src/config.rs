//! Application configuration model (`config.toml`).
//!
//! Every field has a default so a partial or missing file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COMPILE_ENDPOINT: &str = "https://latex.ytotech.com/builds/sync";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OWNER: &str = "local";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RootConfig {
    pub compile: CompileConfig,
    pub editor: EditorConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompileConfig {
    /// Sync build endpoint taking the LaTeX source as `?content=`
    pub endpoint: String,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Per-request timeout; unset means whatever the HTTP client enforces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COMPILE_ENDPOINT.to_string(),
            max_attempts: 20,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5000,
            request_timeout_secs: None,
        }
    }
}

impl CompileConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub debounce_ms: u64,
    pub auto_compile: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3000,
            auto_compile: true,
        }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    /// Falls back to the environment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Owner scope for every store operation
    pub owner: String,
    /// Overrides the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            documents_dir: None,
        }
    }
}
