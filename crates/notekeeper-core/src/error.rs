//! Error types for Notekeeper.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why the identity gateway refused (or failed) an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    InvalidCredentials,
    UnknownAccount,
    DuplicateAccount,
    WeakPassword,
    MalformedEmail,
    /// The operation needs an active session and there is none.
    NotAuthenticated,
    Network,
    Timeout,
    /// Any other refusal; the message carries the gateway's wording.
    Rejected,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidCredentials => "invalid credentials",
            Self::UnknownAccount => "unknown account",
            Self::DuplicateAccount => "duplicate account",
            Self::WeakPassword => "weak password",
            Self::MalformedEmail => "malformed email",
            Self::NotAuthenticated => "not authenticated",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Why the document store refused (or failed) an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailure {
    NotFound,
    PermissionDenied,
    MalformedDocument,
    Network,
    Timeout,
    Rejected,
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::MalformedDocument => "malformed document",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// One failed deletion inside a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDeletion {
    pub note_id: String,
    pub reason: StoreFailure,
    pub message: String,
}

/// Coarse classification used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Auth,
    Store,
    Internal,
}

/// A shared error type for the whole Notekeeper workspace.
///
/// Gateway implementations translate their transport errors into the
/// `Auth` / `Store` variants; the controllers add `Validation`,
/// `BulkDelete` and `AccountDeletionAborted` on top.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotekeeperError {
    /// Rejected locally before any gateway call.
    #[error("Validation error: {field} {message}")]
    Validation { field: String, message: String },

    /// Identity gateway failure
    #[error("Authentication error ({reason}): {message}")]
    Auth { reason: AuthFailure, message: String },

    /// Document store failure
    #[error("Store error ({reason}): {message}")]
    Store { reason: StoreFailure, message: String },

    /// Some deletions of a fan-out delete failed
    #[error("Failed to delete {} note(s): {}", .failed.len(), failed_ids(.failed))]
    BulkDelete { failed: Vec<FailedDeletion> },

    /// Account deletion stopped before the account itself was touched
    #[error("Account deletion aborted: {0}")]
    AccountDeletionAborted(Box<NotekeeperError>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

fn failed_ids(failed: &[FailedDeletion]) -> String {
    failed
        .iter()
        .map(|f| f.note_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl NotekeeperError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn auth(reason: AuthFailure, message: impl Into<String>) -> Self {
        Self::Auth {
            reason,
            message: message.into(),
        }
    }

    pub fn store(reason: StoreFailure, message: impl Into<String>) -> Self {
        Self::Store {
            reason,
            message: message.into(),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::auth(AuthFailure::NotAuthenticated, "no active session")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_auth(&self) -> bool {
        self.category() == ErrorCategory::Auth
    }

    pub fn is_store(&self) -> bool {
        self.category() == ErrorCategory::Store
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Auth {
                reason: AuthFailure::Timeout,
                ..
            } | Self::Store {
                reason: StoreFailure::Timeout,
                ..
            }
        )
    }

    /// Returns the store failure reason, if this is a single store error.
    pub fn store_failure(&self) -> Option<StoreFailure> {
        match self {
            Self::Store { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Returns the auth failure reason, if this is an auth error.
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Auth { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Classifies the error for display.
    ///
    /// An aborted account deletion takes the category of whatever stopped it.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Auth { .. } => ErrorCategory::Auth,
            Self::Store { .. } | Self::BulkDelete { .. } => ErrorCategory::Store,
            Self::AccountDeletionAborted(inner) => inner.category(),
            Self::Config(_) | Self::Io { .. } | Self::Serialization { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NotekeeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NotekeeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NotekeeperError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, NotekeeperError>`.
pub type Result<T> = std::result::Result<T, NotekeeperError>;
