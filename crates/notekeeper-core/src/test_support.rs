//! Hand-written gateway mocks shared by the unit tests of this crate.

use crate::error::{AuthFailure, NotekeeperError, Result, StoreFailure};
use crate::note::{Document, DocumentFields, DocumentStore};
use crate::session::{IdentityGateway, Session};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
pub struct MockStore {
    documents: Mutex<Vec<(String, Document)>>,
    next_id: AtomicUsize,
    offline: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
    create_latencies: Mutex<VecDeque<Duration>>,
    creates: AtomicUsize,
    queries: AtomicUsize,
    deletes: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.failing_deletes.lock().unwrap().insert(id.to_string());
    }

    /// Queues a delay for the next create call.
    pub fn push_latency(&self, delay: Duration) {
        self.create_latencies.lock().unwrap().push_back(delay);
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotekeeperError::store(StoreFailure::Network, "offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn create_document(&self, collection: &str, fields: DocumentFields) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = self.create_latencies.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online()?;

        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.documents.lock().unwrap().push((
            collection.to_string(),
            Document {
                id: id.clone(),
                fields,
                created_at: None,
            },
        ));
        Ok(id)
    }

    async fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .filter(|(c, d)| {
                c == collection && d.fields.get(field).and_then(|v| v.as_str()) == Some(value)
            })
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(NotekeeperError::store(StoreFailure::Network, "connection reset"));
        }
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|(c, d)| !(c == collection && d.id == id));
        if documents.len() == before {
            return Err(NotekeeperError::store(
                StoreFailure::NotFound,
                format!("no document '{id}'"),
            ));
        }
        Ok(())
    }
}

pub struct MockIdentity {
    accounts: Mutex<HashMap<String, (String, Session)>>,
    changes: watch::Sender<Option<Session>>,
    offline: AtomicBool,
    /// When set, sign-out succeeds without publishing a notification.
    silent_sign_out: AtomicBool,
    next_id: AtomicUsize,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::with_current(None)
    }

    /// A gateway that reports `current` on start-up (cold start with a session).
    pub fn with_current(current: Option<Session>) -> Self {
        let (changes, _) = watch::channel(current);
        Self {
            accounts: Mutex::new(HashMap::new()),
            changes,
            offline: AtomicBool::new(false),
            silent_sign_out: AtomicBool::new(false),
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_silent_sign_out(&self, silent: bool) {
        self.silent_sign_out.store(silent, Ordering::SeqCst);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotekeeperError::auth(AuthFailure::Network, "offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for MockIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        self.check_online()?;
        let session = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(NotekeeperError::auth(
                    AuthFailure::DuplicateAccount,
                    "EMAIL_EXISTS",
                ));
            }
            let id = format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let session = Session::new(id, email);
            accounts.insert(email.to_string(), (password.to_string(), session.clone()));
            session
        };
        self.changes.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.check_online()?;
        let session = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some((stored, session)) if stored == password => session.clone(),
                Some(_) => {
                    return Err(NotekeeperError::auth(
                        AuthFailure::InvalidCredentials,
                        "INVALID_PASSWORD",
                    ));
                }
                None => {
                    return Err(NotekeeperError::auth(
                        AuthFailure::UnknownAccount,
                        "EMAIL_NOT_FOUND",
                    ));
                }
            }
        };
        self.changes.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.check_online()?;
        if !self.silent_sign_out.load(Ordering::SeqCst) {
            self.changes.send_replace(None);
        }
        Ok(())
    }

    async fn delete_account(&self, session: &Session) -> Result<()> {
        self.check_online()?;
        self.accounts
            .lock()
            .unwrap()
            .retain(|_, (_, s)| s.user_id != session.user_id);
        self.changes.send_replace(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}
