//! The controller's single subscription to identity notifications.

use super::model::Session;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Forwards identity-gateway notifications into the controller's
/// authoritative session value.
///
/// The spawned task owns the only `watch::Sender` of that value, so nothing
/// else can write it. Dropping the subscription cancels the task.
pub struct SessionSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SessionSubscription {
    /// Spawns the listener. Must be called from within a Tokio runtime.
    ///
    /// `epoch` is bumped once per delivered notification.
    pub(crate) fn spawn(
        mut changes: watch::Receiver<Option<Session>>,
        authoritative: watch::Sender<Option<Session>>,
        epoch: Arc<AtomicU64>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let deliver = |session: Option<Session>| {
                match &session {
                    Some(s) => info!(user_id = %s.user_id, "Session established"),
                    None => info!("No active session"),
                }
                epoch.fetch_add(1, Ordering::SeqCst);
                authoritative.send_replace(session);
            };

            // The current value is the start-up report.
            let initial = changes.borrow_and_update().clone();
            deliver(initial);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Session subscription cancelled");
                        break;
                    }
                    changed = changes.changed() => {
                        if changed.is_err() {
                            debug!("Identity gateway closed its notification channel");
                            break;
                        }
                        let next = changes.borrow_and_update().clone();
                        deliver(next);
                    }
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the listener and waits for it to finish.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
