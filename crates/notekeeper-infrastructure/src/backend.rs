use crate::firebase;
use crate::memory::{InMemoryDocumentStore, InMemoryIdentityService};
use notekeeper_core::NotekeeperConfig;
use notekeeper_core::config::BackendKind;
use notekeeper_core::error::Result;
use notekeeper_core::note::DocumentStore;
use notekeeper_core::session::IdentityGateway;
use std::sync::Arc;
use tracing::info;

/// The pair of gateways a configured backend provides.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub identity: Arc<dyn IdentityGateway>,
    pub store: Arc<dyn DocumentStore>,
}

impl Backend {
    /// Builds the gateways selected by `config.backend.kind`.
    pub fn from_config(config: &NotekeeperConfig) -> Result<Self> {
        config.validate()?;
        match config.backend.kind {
            BackendKind::Memory => Ok(Self::in_memory()),
            BackendKind::Firebase => {
                let (identity, store) = firebase::connect(&config.firebase)?;
                info!(
                    project_id = config.firebase.project_id.as_deref().unwrap_or_default(),
                    "Using Firebase backend"
                );
                Ok(Self {
                    kind: BackendKind::Firebase,
                    identity,
                    store,
                })
            }
        }
    }

    /// Fresh in-process gateways with no accounts and no documents.
    pub fn in_memory() -> Self {
        info!("Using in-memory backend");
        Self {
            kind: BackendKind::Memory,
            identity: Arc::new(InMemoryIdentityService::new()),
            store: Arc::new(InMemoryDocumentStore::new()),
        }
    }
}
