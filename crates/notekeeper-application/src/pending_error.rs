//! The single outstanding error shown to the user.

use notekeeper_core::NotekeeperError;
use notekeeper_core::error::ErrorCategory;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// An error waiting to be dismissed, with the action that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingError {
    pub action: &'static str,
    pub error: NotekeeperError,
}

impl PendingError {
    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Holds at most one [`PendingError`]; a newer error replaces an older one.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    current: Mutex<Option<PendingError>>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, action: &'static str, error: &NotekeeperError) {
        debug!(action, error = %error, "Recording pending error");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(PendingError {
            action,
            error: error.clone(),
        });
    }

    pub fn current(&self) -> Option<PendingError> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the slot and returns what was in it.
    pub fn dismiss(&self) -> Option<PendingError> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
