//! The presentation-facing facade.

use crate::follow::SessionFollower;
use crate::form::{AuthForm, AuthMode};
use crate::pending_error::{ErrorSlot, PendingError};
use notekeeper_core::config::TimeoutSettings;
use notekeeper_core::error::{NotekeeperError, Result};
use notekeeper_core::note::{DocumentStore, Note, NoteId, NotesSynchronizer};
use notekeeper_core::session::{IdentityGateway, SessionController, SessionState, UserId};
use notekeeper_core::NotekeeperConfig;
use notekeeper_infrastructure::Backend;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Everything the presentation layer renders, taken at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AppView {
    pub session: SessionState,
    /// Notes of the session's user; empty unless authenticated
    pub notes: Vec<Note>,
    pub pending_error: Option<PendingError>,
    pub form: AuthForm,
}

/// Wires the session controller, the note synchronizer and the UI-side
/// state (auth form, pending error) together.
///
/// Every operation returns its result and also records a failure in the
/// pending-error slot, where it stays until [`dismiss_error`](Self::dismiss_error)
/// or until a newer failure replaces it.
pub struct NotesApp {
    controller: SessionController,
    notes: Arc<NotesSynchronizer>,
    form: Mutex<AuthForm>,
    errors: Arc<ErrorSlot>,
    follower: Mutex<Option<SessionFollower>>,
}

impl NotesApp {
    /// Must be called from within a Tokio runtime.
    pub fn new(
        identity: Arc<dyn IdentityGateway>,
        store: Arc<dyn DocumentStore>,
        timeouts: &TimeoutSettings,
    ) -> Self {
        let notes = Arc::new(NotesSynchronizer::new(store, timeouts.store()));
        let controller = SessionController::new(identity, notes.clone(), timeouts.auth());
        let errors = Arc::new(ErrorSlot::new());
        let follower = SessionFollower::spawn(controller.watch(), notes.clone(), errors.clone());

        Self {
            controller,
            notes,
            form: Mutex::new(AuthForm::default()),
            errors,
            follower: Mutex::new(Some(follower)),
        }
    }

    pub fn from_backend(backend: &Backend, config: &NotekeeperConfig) -> Self {
        Self::new(
            backend.identity.clone(),
            backend.store.clone(),
            &config.timeouts,
        )
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn notes(&self) -> &Arc<NotesSynchronizer> {
        &self.notes
    }

    pub fn view(&self) -> AppView {
        let session = self.controller.state();
        let list = self.notes.notes();
        let notes = match session.session() {
            Some(s) if list.owner.as_ref() == Some(&s.user_id) => list.notes,
            _ => Vec::new(),
        };

        AppView {
            session,
            notes,
            pending_error: self.errors.current(),
            form: self.form(),
        }
    }

    // ============================================================================
    // Form
    // ============================================================================

    pub fn form(&self) -> AuthForm {
        self.lock_form().clone()
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.lock_form().email = email.into();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.lock_form().password = password.into();
    }

    pub fn toggle_mode(&self) -> AuthMode {
        let mut form = self.lock_form();
        form.toggle_mode();
        form.mode
    }

    /// The form's single button: signs out when authenticated, otherwise
    /// signs in or up according to the form's mode.
    pub async fn submit_auth(&self) -> Result<()> {
        if self.controller.state().is_authenticated() {
            return self.sign_out().await;
        }

        let form = self.form();
        let result = match form.mode {
            AuthMode::SignIn => self.sign_in(&form.email, &form.password).await,
            AuthMode::SignUp => self.sign_up(&form.email, &form.password).await,
        };
        if result.is_ok() {
            self.lock_form().password.clear();
        }
        result
    }

    // ============================================================================
    // Session operations
    // ============================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        self.tracked("sign in", self.controller.sign_in(email, password))
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        self.tracked("sign up", self.controller.sign_up(email, password))
            .await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.tracked("sign out", self.controller.sign_out()).await
    }

    pub async fn delete_account(&self) -> Result<()> {
        self.tracked("delete account", self.controller.delete_account())
            .await
    }

    // ============================================================================
    // Note operations
    // ============================================================================

    pub async fn add_note(&self, text: &str) -> Result<()> {
        self.tracked("add note", async {
            let user_id = self.signed_in_user()?;
            self.notes.add_note(&user_id, text).await.map(drop)
        })
        .await
    }

    pub async fn delete_note(&self, note_id: &NoteId) -> Result<()> {
        self.tracked("delete note", async {
            self.signed_in_user()?;
            self.notes.delete_note(note_id).await.map(drop)
        })
        .await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.tracked("refresh", async {
            let user_id = self.signed_in_user()?;
            self.notes.refresh(&user_id).await.map(drop)
        })
        .await
    }

    // ============================================================================
    // Errors and lifecycle
    // ============================================================================

    pub fn dismiss_error(&self) -> Option<PendingError> {
        self.errors.dismiss()
    }

    /// Stops following the session and tears down the controller's
    /// subscription.
    pub async fn shutdown(&self) {
        let follower = self
            .follower
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(follower) = follower {
            follower.stop().await;
        }
        self.controller.shutdown().await;
        info!("Notes app shut down");
    }

    fn signed_in_user(&self) -> Result<UserId> {
        self.controller
            .state()
            .session()
            .map(|s| s.user_id.clone())
            .ok_or_else(NotekeeperError::not_authenticated)
    }

    async fn tracked<T>(
        &self,
        action: &'static str,
        operation: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        operation
            .await
            .inspect_err(|err| self.errors.record(action, err))
    }

    fn lock_form(&self) -> std::sync::MutexGuard<'_, AuthForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
