use super::gateway::IdentityGateway;
use super::model::{Session, SessionState};
use super::subscription::SessionSubscription;
use crate::deadline;
use crate::error::{NotekeeperError, Result};
use crate::note::NotesSynchronizer;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Owns the authoritative "current user" value.
///
/// `SessionController` is responsible for:
/// - Keeping exactly one subscription to the identity gateway's notifications
/// - Exposing sign in / sign up / sign out / account deletion
/// - Deleting a user's notes before their account
///
/// Operations report success or failure only. The session itself always
/// arrives through the subscription, which is the sole writer of the value
/// returned by [`current_session`](Self::current_session).
pub struct SessionController {
    identity: Arc<dyn IdentityGateway>,
    notes: Arc<NotesSynchronizer>,
    timeout: Duration,
    /// Authoritative session, written by the subscription task only
    session: watch::Receiver<Option<Session>>,
    /// Number of delivered notifications
    epoch: Arc<AtomicU64>,
    /// Epoch at which sign-out was last requested (0 = never)
    sign_out_epoch: AtomicU64,
    /// Operations currently waiting on the identity gateway
    in_flight: AtomicUsize,
    subscription: Mutex<Option<SessionSubscription>>,
}

/// Marks an operation as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SessionController {
    /// Creates the controller and subscribes to `identity`'s notifications.
    ///
    /// Must be called from within a Tokio runtime. The state stays
    /// `Unauthenticated` until the first notification has been delivered.
    pub fn new(
        identity: Arc<dyn IdentityGateway>,
        notes: Arc<NotesSynchronizer>,
        timeout: Duration,
    ) -> Self {
        let (authoritative, session) = watch::channel(None);
        let epoch = Arc::new(AtomicU64::new(0));
        let subscription =
            SessionSubscription::spawn(identity.session_changes(), authoritative, epoch.clone());

        Self {
            identity,
            notes,
            timeout,
            session,
            epoch,
            sign_out_epoch: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// The note synchronizer this controller clears notes through.
    pub fn notes(&self) -> &Arc<NotesSynchronizer> {
        &self.notes
    }

    /// The authoritative session, as last reported by the identity gateway.
    pub fn current_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Returns a receiver of authoritative session changes.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.session.clone()
    }

    /// What the presentation layer should render.
    ///
    /// After a sign-out request the session is hidden until the gateway
    /// delivers its next notification, even if the request failed.
    pub fn state(&self) -> SessionState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return SessionState::Transitioning;
        }

        let hidden_at = self.sign_out_epoch.load(Ordering::SeqCst);
        if hidden_at != 0 && hidden_at == self.epoch.load(Ordering::SeqCst) {
            return SessionState::Unauthenticated;
        }

        match self.current_session() {
            Some(session) => SessionState::Authenticated { session },
            None => SessionState::Unauthenticated,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(SessionSubscription::is_active)
    }

    /// Tears down the notification subscription.
    ///
    /// The last delivered session stays readable; no further changes arrive.
    pub async fn shutdown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
            info!("Session controller shut down");
        }
    }

    /// Signs in with an existing account.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let (email, password) = credentials(email, password)?;
        let _busy = InFlight::begin(&self.in_flight);

        let session = deadline::identity_call(
            self.timeout,
            "sign-in",
            self.identity.sign_in(email, password),
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Sign-in failed"))?;

        info!(user_id = %session.user_id, "User signed in");
        Ok(())
    }

    /// Creates a new account (which also signs it in).
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        let (email, password) = credentials(email, password)?;
        let _busy = InFlight::begin(&self.in_flight);

        let session = deadline::identity_call(
            self.timeout,
            "sign-up",
            self.identity.create_account(email, password),
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Sign-up failed"))?;

        info!(user_id = %session.user_id, "User created");
        Ok(())
    }

    /// Signs out the active session.
    pub async fn sign_out(&self) -> Result<()> {
        if self.current_session().is_none() {
            return Err(NotekeeperError::not_authenticated());
        }

        self.sign_out_epoch
            .store(self.epoch.load(Ordering::SeqCst), Ordering::SeqCst);
        let _busy = InFlight::begin(&self.in_flight);

        deadline::identity_call(self.timeout, "sign-out", self.identity.sign_out())
            .await
            .inspect_err(|e| warn!(error = %e, "Sign-out failed"))?;

        info!("User logged out");
        Ok(())
    }

    /// Deletes every note of the active user, then the account itself.
    ///
    /// If any note cannot be deleted the account is left alone and the
    /// failure comes back wrapped in
    /// [`NotekeeperError::AccountDeletionAborted`].
    pub async fn delete_account(&self) -> Result<()> {
        let session = self
            .current_session()
            .ok_or_else(NotekeeperError::not_authenticated)?;
        let _busy = InFlight::begin(&self.in_flight);

        if let Err(err) = self.notes.delete_all_notes(&session.user_id).await {
            warn!(user_id = %session.user_id, error = %err, "Account deletion aborted");
            return Err(NotekeeperError::AccountDeletionAborted(Box::new(err)));
        }

        deadline::identity_call(
            self.timeout,
            "delete account",
            self.identity.delete_account(&session),
        )
        .await
        .inspect_err(|e| warn!(user_id = %session.user_id, error = %e, "Account deletion failed"))?;

        info!(user_id = %session.user_id, "Account deleted");
        Ok(())
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str)> {
    let email = email.trim();
    if email.is_empty() {
        return Err(NotekeeperError::validation("email", "must not be empty"));
    }
    if password.is_empty() {
        return Err(NotekeeperError::validation("password", "must not be empty"));
    }
    Ok((email, password))
}
