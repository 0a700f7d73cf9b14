//! FirebaseIdentityGateway - email/password auth over the Identity Toolkit REST API.

use super::{FirebaseProject, IdTokenCell, parse_error_body};
use async_trait::async_trait;
use notekeeper_core::error::{AuthFailure, NotekeeperError, Result};
use notekeeper_core::session::{IdentityGateway, Session, UserId};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Identity gateway backed by Firebase Authentication.
///
/// Sign-out is local: the ID token is dropped and a `None` session is
/// published. Nothing is persisted, so every process starts signed out.
pub struct FirebaseIdentityGateway {
    client: Client,
    project: FirebaseProject,
    token: IdTokenCell,
    current: watch::Sender<Option<Session>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    email: String,
    local_id: String,
}

#[derive(Deserialize)]
struct Empty {}

impl FirebaseIdentityGateway {
    pub fn new(client: Client, project: FirebaseProject, token: IdTokenCell) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            client,
            project,
            token,
            current,
        }
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{}", self.project.auth_endpoint, method);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.project.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                NotekeeperError::auth(
                    AuthFailure::Network,
                    format!("Identity Toolkit request failed: {err}"),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Identity Toolkit error body".to_string());
            let (message, _) = parse_error_body(&body);
            return Err(map_identity_error(status, &message));
        }

        response.json().await.map_err(|err| {
            NotekeeperError::auth(
                AuthFailure::Rejected,
                format!("Failed to parse Identity Toolkit response: {err}"),
            )
        })
    }

    async fn authenticate(&self, method: &str, email: &str, password: &str) -> Result<Session> {
        let response: AuthResponse = self
            .call(
                method,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let session = Session {
            user_id: UserId::new(response.local_id),
            email: response.email,
        };
        self.token.set(Some(response.id_token));
        self.current.send_replace(Some(session.clone()));
        debug!(user_id = %session.user_id, method, "Firebase session established");
        Ok(session)
    }
}

/// Maps an Identity Toolkit error onto an [`AuthFailure`].
///
/// Messages look like `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn map_identity_error(status: StatusCode, message: &str) -> NotekeeperError {
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default();

    let reason = match code {
        "EMAIL_EXISTS" => AuthFailure::DuplicateAccount,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthFailure::MalformedEmail,
        "WEAK_PASSWORD" => AuthFailure::WeakPassword,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthFailure::UnknownAccount,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            AuthFailure::InvalidCredentials
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            AuthFailure::NotAuthenticated
        }
        _ if status.is_server_error() => AuthFailure::Network,
        _ => AuthFailure::Rejected,
    };

    let message = if message.is_empty() {
        format!("Identity Toolkit returned {status}")
    } else {
        message.to_string()
    };
    NotekeeperError::auth(reason, message)
}

#[async_trait]
impl IdentityGateway for FirebaseIdentityGateway {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.authenticate("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.token.set(None);
        self.current.send_replace(None);
        Ok(())
    }

    async fn delete_account(&self, session: &Session) -> Result<()> {
        let token = self.token.get().ok_or_else(NotekeeperError::not_authenticated)?;
        let _: Empty = self
            .call("delete", &DeleteRequest { id_token: &token })
            .await?;

        debug!(user_id = %session.user_id, "Firebase account deleted");
        self.token.set(None);
        self.current.send_replace(None);
        Ok(())
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}
