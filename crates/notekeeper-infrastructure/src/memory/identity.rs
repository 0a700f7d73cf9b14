//! In-process identity service.
//!
//! Behaves like the hosted email/password provider closely enough for tests
//! and the offline demo backend: it enforces the same email and password
//! rules and reports the same kinds of refusals.

use async_trait::async_trait;
use notekeeper_core::error::{AuthFailure, NotekeeperError, Result};
use notekeeper_core::session::{IdentityGateway, Session, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Minimum password length accepted by the hosted provider.
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    user_id: UserId,
}

/// In-memory [`IdentityGateway`].
pub struct InMemoryIdentityService {
    /// Accounts keyed by normalized email
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<Session>>,
    offline: AtomicBool,
}

impl InMemoryIdentityService {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulates losing (or regaining) the network.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn account_count(&self) -> usize {
        self.lock_accounts().len()
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotekeeperError::auth(
                AuthFailure::Network,
                "identity service unreachable",
            ));
        }
        Ok(())
    }

    fn publish(&self, session: Option<Session>) {
        debug!(signed_in = session.is_some(), "Publishing session change");
        self.current.send_replace(session);
    }
}

impl Default for InMemoryIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts `local@domain.tld`: one `@`, non-empty local part, and a domain
/// with an inner dot.
pub fn is_well_formed_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[async_trait]
impl IdentityGateway for InMemoryIdentityService {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_online()?;
        if !is_well_formed_email(email) {
            return Err(NotekeeperError::auth(
                AuthFailure::MalformedEmail,
                "INVALID_EMAIL",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(NotekeeperError::auth(
                AuthFailure::WeakPassword,
                format!("WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let key = email.to_lowercase();
        let session = {
            let mut accounts = self.lock_accounts();
            if accounts.contains_key(&key) {
                return Err(NotekeeperError::auth(
                    AuthFailure::DuplicateAccount,
                    "EMAIL_EXISTS",
                ));
            }
            let user_id = UserId::new(Uuid::new_v4().simple().to_string());
            accounts.insert(
                key,
                Account {
                    password: password.to_string(),
                    user_id: user_id.clone(),
                },
            );
            Session {
                user_id,
                email: email.to_string(),
            }
        };

        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.ensure_online()?;
        let session = {
            let accounts = self.lock_accounts();
            let account = accounts.get(&email.to_lowercase()).ok_or_else(|| {
                NotekeeperError::auth(AuthFailure::UnknownAccount, "EMAIL_NOT_FOUND")
            })?;
            if account.password != password {
                return Err(NotekeeperError::auth(
                    AuthFailure::InvalidCredentials,
                    "INVALID_PASSWORD",
                ));
            }
            Session {
                user_id: account.user_id.clone(),
                email: email.to_string(),
            }
        };

        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.ensure_online()?;
        self.publish(None);
        Ok(())
    }

    async fn delete_account(&self, session: &Session) -> Result<()> {
        self.ensure_online()?;
        let removed = {
            let mut accounts = self.lock_accounts();
            let before = accounts.len();
            accounts.retain(|_, account| account.user_id != session.user_id);
            before != accounts.len()
        };
        if !removed {
            return Err(NotekeeperError::auth(
                AuthFailure::UnknownAccount,
                "USER_NOT_FOUND",
            ));
        }

        self.publish(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}
