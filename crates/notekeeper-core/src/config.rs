//! Root configuration model.
//!
//! Stored as `config.toml`; every section is optional so that a missing or
//! empty file is equivalent to [`NotekeeperConfig::default`].
//!
//! ```toml
//! [backend]
//! kind = "firebase"
//!
//! [firebase]
//! api_key = "..."
//! project_id = "loginapp-kk"
//!
//! [timeouts]
//! auth_secs = 15
//! store_secs = 15
//! ```

use crate::error::{NotekeeperError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct NotekeeperConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub firebase: FirebaseSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process identity service and document store.
    #[default]
    Memory,
    Firebase,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
}

/// Firebase project settings.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct FirebaseSettings {
    /// Web API key of the Firebase project
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Override for the Identity Toolkit endpoint (emulators, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_endpoint: Option<String>,
    /// Override for the Firestore endpoint (emulators, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firestore_endpoint: Option<String>,
}

/// Upper bounds for gateway calls, in seconds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TimeoutSettings {
    #[serde(default = "default_timeout_secs")]
    pub auth_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub store_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            auth_secs: default_timeout_secs(),
            store_secs: default_timeout_secs(),
        }
    }
}

impl TimeoutSettings {
    pub fn auth(&self) -> Duration {
        Duration::from_secs(self.auth_secs)
    }

    pub fn store(&self) -> Duration {
        Duration::from_secs(self.store_secs)
    }
}

impl NotekeeperConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "config.toml"
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Checks cross-field requirements that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.auth_secs == 0 || self.timeouts.store_secs == 0 {
            return Err(NotekeeperError::config("timeouts must be at least one second"));
        }
        if self.backend.kind == BackendKind::Firebase {
            let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if missing(&self.firebase.api_key) {
                return Err(NotekeeperError::config(
                    "firebase backend requires firebase.api_key",
                ));
            }
            if missing(&self.firebase.project_id) {
                return Err(NotekeeperError::config(
                    "firebase backend requires firebase.project_id",
                ));
            }
        }
        Ok(())
    }
}
