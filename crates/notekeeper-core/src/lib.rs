//! Core of Notekeeper: session and note state kept consistent with a hosted
//! identity service and document store.
//!
//! Gateways are injected as trait objects ([`session::IdentityGateway`],
//! [`note::DocumentStore`]); concrete backends live in
//! `notekeeper-infrastructure`.

pub mod config;
mod deadline;
pub mod error;
pub mod note;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export common types
pub use config::NotekeeperConfig;
pub use error::{NotekeeperError, Result};
pub use note::{Note, NoteId, NoteList, NotesSynchronizer};
pub use session::{Session, SessionController, SessionState, UserId};
