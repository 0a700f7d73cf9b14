#[cfg(test)]
mod tests {
    use crate::app::NotesApp;
    use crate::form::AuthMode;
    use notekeeper_core::config::TimeoutSettings;
    use notekeeper_core::error::{AuthFailure, ErrorCategory, StoreFailure};
    use notekeeper_core::note::{DocumentStore, NOTES_COLLECTION, OWNER_FIELD};
    use notekeeper_core::session::{Session, SessionState, UserId};
    use notekeeper_infrastructure::{InMemoryDocumentStore, InMemoryIdentityService};
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        app: NotesApp,
        identity: Arc<InMemoryIdentityService>,
        store: Arc<InMemoryDocumentStore>,
    }

    fn harness() -> Harness {
        let identity = Arc::new(InMemoryIdentityService::new());
        let store = Arc::new(InMemoryDocumentStore::new());
        let app = NotesApp::new(identity.clone(), store.clone(), &TimeoutSettings::default());
        Harness {
            app,
            identity,
            store,
        }
    }

    async fn wait_signed_in(app: &NotesApp) -> Session {
        let mut rx = app.controller().watch();
        let session = rx.wait_for(Option::is_some).await.unwrap();
        session.clone().unwrap()
    }

    async fn wait_signed_out(app: &NotesApp) {
        let mut rx = app.controller().watch();
        rx.wait_for(Option::is_none).await.unwrap();
    }

    async fn wait_notes_owner(app: &NotesApp, owner: Option<&UserId>) {
        let mut rx = app.notes().watch();
        rx.wait_for(|list| list.owner.as_ref() == owner).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_up_add_note_then_delete_account() {
        let Harness { app, identity, store } = harness();

        app.sign_up("a@example.com", "secret12").await.unwrap();
        let u1 = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&u1)).await;

        app.add_note("buy milk").await.unwrap();
        let view = app.view();
        assert_eq!(view.notes.len(), 1);
        assert_eq!(view.notes[0].text, "buy milk");
        assert_eq!(view.notes[0].owner_id, u1);

        app.delete_account().await.unwrap();
        wait_signed_out(&app).await;
        wait_notes_owner(&app, None).await;

        let view = app.view();
        assert_eq!(view.session, SessionState::Unauthenticated);
        assert!(view.notes.is_empty());
        assert!(view.pending_error.is_none());
        assert_eq!(identity.account_count(), 0);
        let remaining = store
            .query_documents(NOTES_COLLECTION, OWNER_FIELD, u1.as_str())
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_submit_auth_follows_form_mode() {
        let Harness { app, .. } = harness();

        assert_eq!(app.toggle_mode(), AuthMode::SignUp);
        app.set_email("a@example.com");
        app.set_password("secret12");
        app.submit_auth().await.unwrap();
        let created = wait_signed_in(&app).await;
        assert!(app.form().password.is_empty());
        assert_eq!(app.form().email, "a@example.com");

        // Authenticated: the same button signs out.
        app.submit_auth().await.unwrap();
        wait_signed_out(&app).await;
        assert_eq!(app.view().session, SessionState::Unauthenticated);

        assert_eq!(app.toggle_mode(), AuthMode::SignIn);
        app.set_password("secret12");
        app.submit_auth().await.unwrap();
        let again = wait_signed_in(&app).await;
        assert_eq!(created.user_id, again.user_id);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_password() {
        let Harness { app, .. } = harness();
        app.set_email("a@example.com");
        app.set_password("secret12");

        let err = app.submit_auth().await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::UnknownAccount));
        assert_eq!(app.form().password, "secret12");
        assert_eq!(app.view().pending_error.unwrap().action, "sign in");
    }

    #[tokio::test]
    async fn test_pending_error_is_last_write_wins() {
        let Harness { app, .. } = harness();

        assert!(app.sign_in("", "pw").await.unwrap_err().is_validation());
        let pending = app.view().pending_error.unwrap();
        assert_eq!(pending.action, "sign in");
        assert_eq!(pending.category(), ErrorCategory::Validation);

        let err = app.add_note("hi").await.unwrap_err();
        assert_eq!(err.auth_failure(), Some(AuthFailure::NotAuthenticated));
        assert_eq!(app.view().pending_error.unwrap().action, "add note");

        assert_eq!(app.dismiss_error().map(|p| p.action), Some("add note"));
        assert!(app.view().pending_error.is_none());
    }

    #[tokio::test]
    async fn test_notes_follow_the_signed_in_user() {
        let Harness { app, .. } = harness();

        app.sign_up("a@example.com", "secret12").await.unwrap();
        let a = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&a)).await;
        app.add_note("from a").await.unwrap();

        app.sign_out().await.unwrap();
        wait_signed_out(&app).await;
        wait_notes_owner(&app, None).await;
        assert!(app.view().notes.is_empty());

        app.sign_up("b@example.com", "secret12").await.unwrap();
        let b = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&b)).await;
        assert!(app.view().notes.is_empty());

        app.add_note("from b").await.unwrap();
        let texts: Vec<_> = app.view().notes.into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["from b".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_note_and_refresh() {
        let Harness { app, store, .. } = harness();

        app.sign_up("a@example.com", "secret12").await.unwrap();
        let a = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&a)).await;
        app.add_note("one").await.unwrap();
        app.add_note("two").await.unwrap();

        let first = app.view().notes[0].id.clone();
        app.delete_note(&first).await.unwrap();
        let view = app.view();
        assert_eq!(view.notes.len(), 1);
        assert_eq!(view.notes[0].text, "two");

        let err = app.delete_note(&first).await.unwrap_err();
        assert_eq!(err.store_failure(), Some(StoreFailure::NotFound));
        assert_eq!(app.view().notes.len(), 1);

        let before = store.calls().query;
        app.refresh().await.unwrap();
        assert_eq!(store.calls().query, before + 1);
        assert_eq!(app.view().notes.len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_delete_another_users_note() {
        let Harness { app, store, .. } = harness();

        app.sign_up("alice@example.com", "secret12").await.unwrap();
        let alice = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&alice)).await;
        app.add_note("alice private").await.unwrap();
        let alice_note = app.view().notes[0].id.clone();
        app.sign_out().await.unwrap();
        wait_signed_out(&app).await;

        app.sign_up("bob@example.com", "secret12").await.unwrap();
        let bob = wait_signed_in(&app).await.user_id;
        wait_notes_owner(&app, Some(&bob)).await;

        let err = app.delete_note(&alice_note).await.unwrap_err();
        assert_eq!(err.store_failure(), Some(StoreFailure::NotFound));
        assert_eq!(app.view().pending_error.unwrap().action, "delete note");

        let remaining = store
            .query_documents(NOTES_COLLECTION, OWNER_FIELD, alice.as_str())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_initial_load_is_reported() {
        let Harness { app, store, .. } = harness();
        store.set_offline(true);

        app.sign_up("a@example.com", "secret12").await.unwrap();
        wait_signed_in(&app).await;

        tokio::time::timeout(Duration::from_secs(5), async {
            while app.view().pending_error.is_none() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let pending = app.dismiss_error().unwrap();
        assert_eq!(pending.action, "load notes");
        assert_eq!(pending.error.store_failure(), Some(StoreFailure::Network));

        // A manual refresh corrects the stale list.
        store.set_offline(false);
        app.refresh().await.unwrap();
        assert!(app.view().notes.is_empty());
        assert!(app.view().pending_error.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_tears_down_subscriptions() {
        let Harness { app, .. } = harness();
        app.sign_up("a@example.com", "secret12").await.unwrap();
        wait_signed_in(&app).await;
        assert!(app.controller().is_subscribed());

        app.shutdown().await;
        assert!(!app.controller().is_subscribed());
    }
}
