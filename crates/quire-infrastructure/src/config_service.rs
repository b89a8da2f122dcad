//! Configuration service.
//!
//! Loads the root configuration from `~/.config/quire/config.toml`, writing
//! a default file on first run.

use crate::paths::QuirePaths;
use crate::storage::AtomicTomlFile;
use quire_core::config::RootConfig;
use quire_core::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Loads and caches the root configuration.
///
/// The file is read lazily on first access. A missing file is created with
/// defaults; an unreadable one is logged and replaced by defaults in memory
/// only, so a typo never wipes the user's file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: QuirePaths,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(paths: QuirePaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    pub async fn get_config(&self) -> RootConfig {
        if let Some(cached) = self.config.read().await.as_ref() {
            return cached.clone();
        }

        let loaded = match self.load_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                RootConfig::default()
            }
        };

        *self.config.write().await = Some(loaded.clone());
        loaded
    }

    /// Writes `config` to disk and caches it.
    pub async fn save_config(&self, config: &RootConfig) -> Result<()> {
        self.file()?.save(config).await?;
        *self.config.write().await = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub async fn invalidate_cache(&self) {
        *self.config.write().await = None;
    }

    /// Where documents are stored: the `[storage] documents_dir` override or
    /// the platform data directory.
    pub async fn documents_dir(&self) -> Result<PathBuf> {
        match self.get_config().await.storage.documents_dir {
            Some(dir) => Ok(dir),
            None => Ok(self.paths.documents_dir()?),
        }
    }

    pub fn paths(&self) -> &QuirePaths {
        &self.paths
    }

    async fn load_config(&self) -> Result<RootConfig> {
        let file = self.file()?;
        match file.load().await? {
            Some(config) => Ok(config),
            None => {
                let config = RootConfig::default();
                file.save(&config).await?;
                tracing::info!(path = %file.path().display(), "Wrote default config");
                Ok(config)
            }
        }
    }

    fn file(&self) -> Result<AtomicTomlFile<RootConfig>> {
        Ok(AtomicTomlFile::new(self.paths.config_file()?))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(QuirePaths::default())
    }
}
