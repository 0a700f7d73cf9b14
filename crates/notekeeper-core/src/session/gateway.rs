//! Identity gateway trait.
//!
//! Defines the interface to the hosted identity service.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// An abstract capability for the hosted identity service.
///
/// This trait decouples the session controller from the concrete backend
/// (Firebase, an in-memory fake, ...).
///
/// # Implementation Notes
///
/// - Failures must be reported as [`NotekeeperError::Auth`](crate::NotekeeperError::Auth).
/// - Every session transition (sign-in, sign-up, sign-out, account
///   deletion) must be published on the channel returned by
///   [`session_changes`](IdentityGateway::session_changes). The channel's
///   current value is the start-up report (an existing session or `None`).
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Creates a new account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Session>;

    /// Signs in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Signs out the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Deletes the account that owns `session`, ending the session.
    async fn delete_account(&self, session: &Session) -> Result<()>;

    /// Returns a receiver of session transitions.
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;
}
