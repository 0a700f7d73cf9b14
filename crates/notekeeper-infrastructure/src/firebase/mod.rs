//! Firebase REST gateways.
//!
//! - `auth`: [`FirebaseIdentityGateway`] over the Identity Toolkit REST API
//! - `firestore`: [`FirestoreDocumentStore`] over the Cloud Firestore REST API
//! - `value`: JSON <-> Firestore typed value conversion
//!
//! Both gateways share an [`IdTokenCell`]: the identity gateway stores the
//! ID token it receives on sign-in, and the document store sends it as a
//! bearer token so that security rules see the signed-in user.

mod auth;
mod firestore;
mod value;

pub use auth::{FirebaseIdentityGateway, map_identity_error};
pub use firestore::FirestoreDocumentStore;
pub use value::{from_firestore_fields, to_firestore_fields};

use notekeeper_core::config::FirebaseSettings;
use notekeeper_core::error::{NotekeeperError, Result};
use serde::Deserialize;
use std::sync::{Arc, PoisonError, RwLock};

pub const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// The ID token of the signed-in user, shared between the two gateways.
#[derive(Debug, Clone, Default)]
pub struct IdTokenCell(Arc<RwLock<Option<String>>>);

impl IdTokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

/// Connection details resolved from [`FirebaseSettings`].
#[derive(Debug, Clone)]
pub struct FirebaseProject {
    pub api_key: String,
    pub project_id: String,
    pub auth_endpoint: String,
    pub firestore_endpoint: String,
}

impl FirebaseProject {
    pub fn from_settings(settings: &FirebaseSettings) -> Result<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| NotekeeperError::config(format!("firebase.{name} is not set")))
        };

        Ok(Self {
            api_key: required(&settings.api_key, "api_key")?,
            project_id: required(&settings.project_id, "project_id")?,
            auth_endpoint: settings
                .auth_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTH_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
            firestore_endpoint: settings
                .firestore_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_FIRESTORE_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Builds both gateways for one project, sharing one HTTP client and token.
pub fn connect(
    settings: &FirebaseSettings,
) -> Result<(Arc<FirebaseIdentityGateway>, Arc<FirestoreDocumentStore>)> {
    let project = FirebaseProject::from_settings(settings)?;
    let client = reqwest::Client::new();
    let token = IdTokenCell::new();

    let identity = FirebaseIdentityGateway::new(client.clone(), project.clone(), token.clone());
    let store = FirestoreDocumentStore::new(client, project, token);
    Ok((Arc::new(identity), Arc::new(store)))
}

/// Google API error envelope, shared by both REST APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pulls `(message, status)` out of an error response body.
fn parse_error_body(body: &str) -> (String, Option<String>) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), None),
    }
}
