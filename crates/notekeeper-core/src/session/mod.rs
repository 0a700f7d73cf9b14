//! Session domain module.
//!
//! This module contains the session model, the identity gateway interface
//! and the controller that owns the authoritative session.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `UserId`, `SessionState`
//! - `gateway`: `IdentityGateway` trait for the hosted identity service
//! - `subscription`: the controller's notification listener
//! - `controller`: `SessionController`

mod controller;
mod gateway;
mod model;
mod subscription;

#[cfg(test)]
mod controller_test;

// Re-export public API
pub use controller::SessionController;
pub use gateway::IdentityGateway;
pub use model::{Session, SessionState, UserId};
pub use subscription::SessionSubscription;
