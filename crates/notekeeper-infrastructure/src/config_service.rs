//! Configuration service implementation.
//!
//! Loads [`NotekeeperConfig`] from `~/.config/notekeeper/config.toml` (or an
//! explicit path), applies environment and command-line overrides and
//! validates the result.

use crate::paths::NotekeeperPaths;
use notekeeper_core::NotekeeperConfig;
use notekeeper_core::config::BackendKind;
use notekeeper_core::error::{NotekeeperError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

pub const ENV_FIREBASE_API_KEY: &str = "NOTEKEEPER_FIREBASE_API_KEY";
pub const ENV_FIREBASE_PROJECT_ID: &str = "NOTEKEEPER_FIREBASE_PROJECT_ID";

/// Loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file; `None` means the default location
    path: Option<PathBuf>,
    /// Replaces `[backend] kind` before validation
    backend: Option<BackendKind>,
    config: Arc<RwLock<Option<NotekeeperConfig>>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_path(None)
    }

    pub fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            path,
            backend: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Forces the backend kind regardless of what the file says.
    pub fn with_backend(mut self, backend: Option<BackendKind>) -> Self {
        self.backend = backend;
        self
    }

    /// Returns the configuration, loading it on first access.
    pub fn get_config(&self) -> Result<NotekeeperConfig> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let path = self.config_path()?;
        let loaded = load_config(&path, self.backend, |name| std::env::var(name).ok())?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => NotekeeperPaths::config_file().map_err(|e| NotekeeperError::config(e.to_string())),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `path` (a missing file means defaults), applies overrides from
/// `env` and `backend`, then validates.
pub fn load_config(
    path: &Path,
    backend: Option<BackendKind>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<NotekeeperConfig> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| NotekeeperError::io(format!("Failed to read {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded config file");
        NotekeeperConfig::from_toml(&contents)?
    } else {
        info!(path = %path.display(), "No config file, using defaults");
        NotekeeperConfig::default()
    };

    apply_env_overrides(&mut config, env);
    if let Some(kind) = backend {
        debug!(backend = ?kind, "Backend kind overridden");
        config.backend.kind = kind;
    }
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut NotekeeperConfig, env: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(api_key) = non_empty(ENV_FIREBASE_API_KEY) {
        config.firebase.api_key = Some(api_key);
    }
    if let Some(project_id) = non_empty(ENV_FIREBASE_PROJECT_ID) {
        config.firebase.project_id = Some(project_id);
    }
}
