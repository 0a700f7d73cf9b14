#[cfg(test)]
mod tests {
    use crate::error::{AuthFailure, NotekeeperError, Result};
    use crate::note::{NOTES_COLLECTION, NotesSynchronizer, OWNER_FIELD, DocumentStore};
    use crate::session::{IdentityGateway, Session, SessionController, SessionState};
    use crate::test_support::{MockIdentity, MockStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn controller(identity: &Arc<MockIdentity>, store: &Arc<MockStore>) -> SessionController {
        let notes = Arc::new(NotesSynchronizer::new(store.clone(), TIMEOUT));
        SessionController::new(identity.clone(), notes, TIMEOUT)
    }

    async fn signed_in(controller: &SessionController) -> Session {
        let mut rx = controller.watch();
        let session = rx.wait_for(Option::is_some).await.unwrap();
        session.clone().unwrap()
    }

    async fn signed_out(controller: &SessionController) {
        let mut rx = controller.watch();
        rx.wait_for(Option::is_none).await.unwrap();
    }

    // Identity gateway that never answers
    struct HangingIdentity {
        changes: watch::Sender<Option<Session>>,
    }

    impl HangingIdentity {
        fn new() -> Self {
            let (changes, _) = watch::channel(None);
            Self { changes }
        }
    }

    #[async_trait]
    impl IdentityGateway for HangingIdentity {
        async fn create_account(&self, _email: &str, _password: &str) -> Result<Session> {
            std::future::pending().await
        }

        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session> {
            std::future::pending().await
        }

        async fn sign_out(&self) -> Result<()> {
            std::future::pending().await
        }

        async fn delete_account(&self, _session: &Session) -> Result<()> {
            std::future::pending().await
        }

        fn session_changes(&self) -> watch::Receiver<Option<Session>> {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn test_starts_unauthenticated_until_first_notification() {
        let identity = Arc::new(MockIdentity::with_current(Some(Session::new("u9", "x@y.io"))));
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        // Nothing delivered yet: the listener has not run.
        assert_eq!(controller.state(), SessionState::Unauthenticated);

        // Cold start with an existing session.
        let session = signed_in(&controller).await;
        assert_eq!(session.user_id.as_str(), "u9");
        assert!(controller.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in_yields_same_user() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        controller.sign_up("a@example.com", "secret12").await.unwrap();
        let created = signed_in(&controller).await;

        controller.sign_out().await.unwrap();
        signed_out(&controller).await;
        assert_eq!(controller.state(), SessionState::Unauthenticated);

        controller.sign_in("a@example.com", "secret12").await.unwrap();
        let again = signed_in(&controller).await;
        assert_eq!(created.user_id, again.user_id);
        assert_eq!(again.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_empty_credentials_are_rejected_locally() {
        let identity = Arc::new(MockIdentity::new());
        // Any gateway call would fail with a network error.
        identity.set_offline(true);
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        assert!(controller.sign_in("", "pw").await.unwrap_err().is_validation());
        assert!(controller.sign_in("  ", "pw").await.unwrap_err().is_validation());
        assert!(controller.sign_up("a@b.co", "").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_wrong_password_is_an_auth_error() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);
        controller.sign_up("a@example.com", "secret12").await.unwrap();
        signed_in(&controller).await;
        controller.sign_out().await.unwrap();
        signed_out(&controller).await;

        let err = controller.sign_in("a@example.com", "nope").await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::InvalidCredentials));

        let err = controller.sign_up("a@example.com", "other123").await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::DuplicateAccount));
    }

    #[tokio::test]
    async fn test_sign_out_requires_session() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        let err = controller.sign_out().await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::NotAuthenticated));
        let err = controller.delete_account().await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_failed_sign_out_hides_session_until_next_notification() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);
        controller.sign_up("a@example.com", "secret12").await.unwrap();
        signed_in(&controller).await;

        identity.set_offline(true);
        let err = controller.sign_out().await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::Network));

        // UI treats the intent as terminal; the authoritative value is untouched.
        assert_eq!(controller.state(), SessionState::Unauthenticated);
        assert!(controller.current_session().is_some());

        // The next notification decides again.
        identity.set_offline(false);
        let mut rx = controller.watch();
        rx.borrow_and_update();
        controller.sign_in("a@example.com", "secret12").await.unwrap();
        rx.changed().await.unwrap();
        assert!(controller.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_without_notification_stays_hidden() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);
        controller.sign_up("a@example.com", "secret12").await.unwrap();
        signed_in(&controller).await;

        identity.set_silent_sign_out(true);
        controller.sign_out().await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(controller.state(), SessionState::Unauthenticated);
        assert!(controller.current_session().is_some());
    }

    #[tokio::test]
    async fn test_delete_account_removes_notes_then_account() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        controller.sign_up("a@example.com", "secret12").await.unwrap();
        let session = signed_in(&controller).await;
        let u1 = session.user_id.clone();

        let list = controller.notes().add_note(&u1, "buy milk").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.notes[0].text, "buy milk");
        assert_eq!(list.notes[0].owner_id, u1);

        controller.delete_account().await.unwrap();
        signed_out(&controller).await;

        assert!(controller.notes().notes().is_empty());
        assert!(controller.current_session().is_none());
        assert_eq!(identity.account_count(), 0);
        let remaining = store
            .query_documents(NOTES_COLLECTION, OWNER_FIELD, u1.as_str())
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_delete_account_aborts_when_a_note_survives() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);

        controller.sign_up("a@example.com", "secret12").await.unwrap();
        let u1 = signed_in(&controller).await.user_id;
        controller.notes().add_note(&u1, "one").await.unwrap();
        let list = controller.notes().add_note(&u1, "two").await.unwrap();
        store.fail_delete_of(list.notes[1].id.as_str());

        let err = controller.delete_account().await.unwrap_err();
        match &err {
            NotekeeperError::AccountDeletionAborted(inner) => {
                assert!(matches!(**inner, NotekeeperError::BulkDelete { .. }));
            }
            other => panic!("expected AccountDeletionAborted, got {other:?}"),
        }
        assert!(err.is_store());

        // The account and session survive.
        assert_eq!(identity.account_count(), 1);
        assert!(controller.current_session().is_some());
        assert_eq!(controller.notes().notes().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_following_the_gateway() {
        let identity = Arc::new(MockIdentity::new());
        let store = Arc::new(MockStore::new());
        let controller = controller(&identity, &store);
        controller.sign_up("a@example.com", "secret12").await.unwrap();
        signed_in(&controller).await;
        assert!(controller.is_subscribed());

        controller.shutdown().await;
        assert!(!controller.is_subscribed());

        identity.sign_out().await.unwrap();
        tokio::task::yield_now().await;
        assert!(controller.current_session().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_gateway_times_out() {
        let identity = Arc::new(HangingIdentity::new());
        let store = Arc::new(MockStore::new());
        let notes = Arc::new(NotesSynchronizer::new(store, TIMEOUT));
        let controller = Arc::new(SessionController::new(identity, notes, TIMEOUT));

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.sign_in("a@example.com", "pw").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(controller.state(), SessionState::Transitioning);

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.auth_failure(), Some(AuthFailure::Timeout));
        assert_eq!(controller.state(), SessionState::Unauthenticated);
    }
}
