//! Application layer for Notekeeper.
//!
//! [`NotesApp`] is what a presentation layer talks to: it reads [`AppView`]
//! snapshots and invokes operations, while the core controllers keep the
//! session and the note list consistent with the hosted services.

pub mod app;
pub mod follow;
pub mod form;
pub mod pending_error;

#[cfg(test)]
mod app_test;

pub use app::{AppView, NotesApp};
pub use follow::SessionFollower;
pub use form::{AuthForm, AuthMode};
pub use pending_error::{ErrorSlot, PendingError};
