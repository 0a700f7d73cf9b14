//! Keeps the note list in step with the authoritative session.

use crate::pending_error::ErrorSlot;
use notekeeper_core::note::NotesSynchronizer;
use notekeeper_core::session::Session;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Background task that loads the signed-in user's notes and clears them
/// when the session ends.
pub struct SessionFollower {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SessionFollower {
    /// Spawns the follower. Must be called from within a Tokio runtime.
    pub fn spawn(
        mut sessions: watch::Receiver<Option<Session>>,
        notes: Arc<NotesSynchronizer>,
        errors: Arc<ErrorSlot>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let session = sessions.borrow_and_update().clone();
                match session {
                    Some(session) => {
                        debug!(user_id = %session.user_id, "Loading notes for session");
                        if let Err(err) = notes.refresh(&session.user_id).await {
                            warn!(user_id = %session.user_id, error = %err, "Initial note load failed");
                            errors.record("load notes", &err);
                        }
                    }
                    None => notes.clear().await,
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = sessions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Session follower stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for SessionFollower {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
