//! In-process document store.

use async_trait::async_trait;
use chrono::Utc;
use notekeeper_core::error::{NotekeeperError, Result, StoreFailure};
use notekeeper_core::note::{Document, DocumentFields, DocumentStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Number of calls each operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub query: usize,
    pub delete: usize,
}

/// In-memory [`DocumentStore`].
///
/// Queries return documents in creation order. Call counters, an offline
/// switch and per-id delete failures make it usable as a test double for the
/// synchronizer's consistency rules.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    /// collection -> documents in creation order
    collections: Mutex<HashMap<String, Vec<Document>>>,
    offline: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
    creates: AtomicUsize,
    queries: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every deletion of `id` fail with a network error.
    pub fn fail_deletes_of(&self, id: &str) {
        self.failing_deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            create: self.creates.load(Ordering::SeqCst),
            query: self.queries.load(Ordering::SeqCst),
            delete: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Total number of documents across collections.
    pub fn len(&self) -> usize {
        self.lock_collections().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_collections(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn round_trip(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotekeeperError::store(
                StoreFailure::Network,
                "document store unreachable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, collection: &str, fields: DocumentFields) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let id = Uuid::new_v4().simple().to_string();
        self.lock_collections()
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
                created_at: Some(Utc::now()),
            });
        Ok(id)
    }

    async fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let collections = self.lock_collections();
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| d.fields.get(field).and_then(|v| v.as_str()) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        if self
            .failing_deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
        {
            return Err(NotekeeperError::store(
                StoreFailure::Network,
                format!("connection reset while deleting '{id}'"),
            ));
        }

        let mut collections = self.lock_collections();
        let documents = collections.get_mut(collection);
        let position = documents
            .as_ref()
            .and_then(|docs| docs.iter().position(|d| d.id == id));
        match (documents, position) {
            (Some(docs), Some(index)) => {
                docs.remove(index);
                Ok(())
            }
            _ => Err(NotekeeperError::store(
                StoreFailure::NotFound,
                format!("no document '{collection}/{id}'"),
            )),
        }
    }
}
