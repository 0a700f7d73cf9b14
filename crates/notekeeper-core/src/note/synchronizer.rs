use super::gateway::DocumentStore;
use super::model::{NOTES_COLLECTION, NewNote, Note, NoteId, NoteList, OWNER_FIELD};
use crate::deadline;
use crate::error::{FailedDeletion, NotekeeperError, Result, StoreFailure};
use crate::session::UserId;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Keeps an in-memory list of the current user's notes that mirrors the store.
///
/// Every mutation is followed by a full refresh, so the list never asserts an
/// id or a count the store has not confirmed. All operations, including a
/// bare [`refresh`](Self::refresh), run under one async mutex, so a second
/// mutation cannot start before the first one's refresh has landed.
pub struct NotesSynchronizer {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
    /// Latest confirmed list; replaced wholesale, never patched
    list: watch::Sender<NoteList>,
    /// Serializes "mutate -> refresh"
    op_lock: Mutex<()>,
}

impl NotesSynchronizer {
    /// Creates a synchronizer over `store`; every store call is bounded by `timeout`.
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        let (list, _) = watch::channel(NoteList::default());
        Self {
            store,
            timeout,
            list,
            op_lock: Mutex::new(()),
        }
    }

    /// Returns a snapshot of the current list.
    pub fn notes(&self) -> NoteList {
        self.list.borrow().clone()
    }

    /// Returns a receiver that observes every list replacement.
    pub fn watch(&self) -> watch::Receiver<NoteList> {
        self.list.subscribe()
    }

    /// Re-queries the store and replaces the list.
    ///
    /// On failure the previous list is left untouched.
    pub async fn refresh(&self, user_id: &UserId) -> Result<NoteList> {
        let _op = self.op_lock.lock().await;
        self.refresh_locked(user_id).await
    }

    /// Creates a note for `user_id`, then refreshes.
    ///
    /// Blank text is rejected with a validation error before any store call.
    pub async fn add_note(&self, user_id: &UserId, text: &str) -> Result<NoteList> {
        let note = NewNote::new(user_id, text)?;

        let _op = self.op_lock.lock().await;
        let id = deadline::store_call(
            self.timeout,
            "create note",
            self.store.create_document(NOTES_COLLECTION, note.into_fields()),
        )
        .await
        .inspect_err(|e| warn!(user_id = %user_id, error = %e, "Failed to create note"))?;
        info!(user_id = %user_id, note_id = %id, "Note created");

        self.refresh_locked(user_id).await
    }

    /// Deletes one note by id, then refreshes the current owner's list.
    ///
    /// Only ids in the loaded list can be deleted; any other id fails with
    /// `NotFound` without a store call. If the store refuses the list is
    /// unchanged.
    pub async fn delete_note(&self, note_id: &NoteId) -> Result<NoteList> {
        let _op = self.op_lock.lock().await;
        let (owner, listed) = {
            let list = self.list.borrow();
            (list.owner.clone(), list.contains(note_id))
        };
        let owner =
            owner.ok_or_else(|| NotekeeperError::validation("owner", "no note list is loaded"))?;
        if !listed {
            warn!(user_id = %owner, note_id = %note_id, "Refusing to delete unlisted note");
            return Err(NotekeeperError::store(
                StoreFailure::NotFound,
                format!("note {note_id} is not in the list of {owner}"),
            ));
        }

        deadline::store_call(
            self.timeout,
            "delete note",
            self.store.delete_document(NOTES_COLLECTION, note_id.as_str()),
        )
        .await
        .inspect_err(|e| warn!(note_id = %note_id, error = %e, "Failed to delete note"))?;
        info!(user_id = %owner, note_id = %note_id, "Note deleted");

        self.refresh_locked(&owner).await
    }

    /// Deletes every note owned by `user_id`.
    ///
    /// All deletions are attempted even when some fail; the result is an
    /// aggregate error naming each failed id. Returns the number of deleted
    /// notes on success.
    pub async fn delete_all_notes(&self, user_id: &UserId) -> Result<usize> {
        let _op = self.op_lock.lock().await;
        let notes = self.query(user_id).await?;

        let deletions = notes.iter().map(|note| {
            deadline::store_call(
                self.timeout,
                "delete note",
                self.store.delete_document(NOTES_COLLECTION, note.id.as_str()),
            )
        });
        let outcomes = join_all(deletions).await;

        let failed: Vec<FailedDeletion> = notes
            .iter()
            .zip(outcomes)
            .filter_map(|(note, outcome)| {
                outcome.err().map(|err| FailedDeletion {
                    note_id: note.id.to_string(),
                    reason: err.store_failure().unwrap_or(StoreFailure::Rejected),
                    message: err.to_string(),
                })
            })
            .collect();

        match self.refresh_locked(user_id).await {
            Ok(_) => {}
            Err(e) if failed.is_empty() => return Err(e),
            Err(e) => warn!(user_id = %user_id, error = %e, "Refresh after partial delete failed"),
        }

        if !failed.is_empty() {
            warn!(
                user_id = %user_id,
                failed = failed.len(),
                total = notes.len(),
                "Bulk note deletion incomplete"
            );
            return Err(NotekeeperError::BulkDelete { failed });
        }

        info!(user_id = %user_id, deleted = notes.len(), "All notes deleted");
        Ok(notes.len())
    }

    /// Drops the list and its owner, e.g. once the session has ended.
    ///
    /// Waits for any in-flight operation so that its refresh cannot land after
    /// the clear.
    pub async fn clear(&self) {
        let _op = self.op_lock.lock().await;
        self.list.send_replace(NoteList::default());
        debug!("Note list cleared");
    }

    async fn query(&self, user_id: &UserId) -> Result<Vec<Note>> {
        let documents = deadline::store_call(
            self.timeout,
            "query notes",
            self.store
                .query_documents(NOTES_COLLECTION, OWNER_FIELD, user_id.as_str()),
        )
        .await?;

        documents.into_iter().map(Note::from_document).collect()
    }

    async fn refresh_locked(&self, user_id: &UserId) -> Result<NoteList> {
        let notes = self
            .query(user_id)
            .await
            .inspect_err(|e| warn!(user_id = %user_id, error = %e, "Note refresh failed"))?;
        debug!(user_id = %user_id, count = notes.len(), "Note list refreshed");

        let list = NoteList {
            owner: Some(user_id.clone()),
            notes,
        };
        self.list.send_replace(list.clone());
        Ok(list)
    }
}
