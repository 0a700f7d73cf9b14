//! Path resolution for notekeeper configuration files.
//!
//! ```text
//! ~/.config/notekeeper/        # Config directory (platform config dir)
//! └── config.toml              # Application configuration
//! ```

use notekeeper_core::NotekeeperConfig;
use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct NotekeeperPaths;

impl NotekeeperPaths {
    const APP_DIR: &'static str = "notekeeper";

    /// Returns the notekeeper configuration directory
    /// (e.g. `~/.config/notekeeper/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(NotekeeperConfig::filename()))
    }
}
