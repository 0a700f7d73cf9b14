//! Document store gateway trait.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field map of a stored document.
pub type DocumentFields = serde_json::Map<String, serde_json::Value>;

/// A document as returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: DocumentFields,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An abstract capability for the hosted document database.
///
/// Implementations report failures as
/// [`NotekeeperError::Store`](crate::NotekeeperError::Store); deleting an id
/// that does not exist must fail with
/// [`StoreFailure::NotFound`](crate::error::StoreFailure::NotFound).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns the id the store assigned.
    async fn create_document(&self, collection: &str, fields: DocumentFields) -> Result<String>;

    /// Returns every document of `collection` whose `field` equals `value`,
    /// in the store's own order.
    async fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>>;

    /// Deletes one document by id.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}
