//! Path management for Quire's configuration, documents and logs.

use quire_core::error::QuireError;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "quire";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform has no config or data directory for this user.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for QuireError {
    fn from(err: PathError) -> Self {
        QuireError::config(err.to_string())
    }
}

/// Resolves where Quire keeps its files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/quire/             # Config directory
/// ├── config.toml              # Application configuration
/// └── logs/                    # REPL logs
///     └── quire.log.YYYY-MM-DD
///
/// ~/.local/share/quire/        # Data directory
/// └── documents/               # One TOML file per document
///     └── <uuid>.toml
/// ```
///
/// With a base directory (tests, portable installs) both trees live under
/// `<base>/config` and `<base>/data` instead.
#[derive(Debug, Clone, Default)]
pub struct QuirePaths {
    base_dir: Option<PathBuf>,
}

impl QuirePaths {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Returns the Quire configuration directory (e.g. `~/.config/quire/`).
    ///
    /// # Errors
    ///
    /// Returns `PathError::HomeDirNotFound` if the platform directory is unknown.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the Quire data directory (e.g. `~/.local/share/quire/`).
    ///
    /// # Errors
    ///
    /// Returns `PathError::HomeDirNotFound` if the platform directory is unknown.
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn documents_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("documents"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_dir_overrides_platform_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = QuirePaths::new(Some(temp_dir.path()));

        assert_eq!(
            paths.config_file().unwrap(),
            temp_dir.path().join("config").join("config.toml")
        );
        assert_eq!(
            paths.documents_dir().unwrap(),
            temp_dir.path().join("data").join("documents")
        );
        assert_eq!(
            paths.logs_dir().unwrap(),
            temp_dir.path().join("config").join("logs")
        );
    }
}
