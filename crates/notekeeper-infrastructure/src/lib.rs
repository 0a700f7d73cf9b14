pub mod backend;
pub mod config_service;
pub mod firebase;
pub mod memory;
pub mod paths;

pub use crate::backend::Backend;
pub use crate::config_service::ConfigService;
pub use crate::firebase::{FirebaseIdentityGateway, FirestoreDocumentStore};
pub use crate::memory::{InMemoryDocumentStore, InMemoryIdentityService};
pub use crate::paths::NotekeeperPaths;
