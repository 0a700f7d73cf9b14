//! In-process gateways, used by tests and by the `memory` backend.

mod document_store;
mod identity;

pub use document_store::{CallCounts, InMemoryDocumentStore};
pub use identity::{InMemoryIdentityService, MIN_PASSWORD_LEN, is_well_formed_email};
