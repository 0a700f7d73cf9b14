//! FirestoreDocumentStore - document CRUD over the Cloud Firestore REST API.

use super::value::{from_firestore_fields, to_firestore_fields};
use super::{FirebaseProject, IdTokenCell, parse_error_body};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notekeeper_core::error::{NotekeeperError, Result, StoreFailure};
use notekeeper_core::note::{Document, DocumentFields, DocumentStore};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Document store backed by Cloud Firestore.
///
/// Requests carry the signed-in user's ID token, if any.
pub struct FirestoreDocumentStore {
    client: Client,
    project: FirebaseProject,
    token: IdTokenCell,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
    #[serde(default)]
    create_time: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> Result<Document> {
        let id = document_id(&self.name).to_string();
        let created_at = self
            .create_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));
        Ok(Document {
            id,
            fields: from_firestore_fields(self.fields.as_ref())?,
            created_at,
        })
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// `projects/p/databases/(default)/documents/notes/abc` -> `abc`
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

impl FirestoreDocumentStore {
    pub fn new(client: Client, project: FirebaseProject, token: IdTokenCell) -> Self {
        Self {
            client,
            project,
            token,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.project.firestore_endpoint, self.project.project_id
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> Result<Response> {
        let response = self.authorized(builder).send().await.map_err(|err| {
            NotekeeperError::store(
                StoreFailure::Network,
                format!("Firestore {operation} request failed: {err}"),
            )
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read Firestore error body".to_string());
        let (message, grpc_status) = parse_error_body(&body);
        Err(map_store_error(status, grpc_status.as_deref(), operation, &message))
    }

    async fn parse<R: DeserializeOwned>(response: Response, operation: &str) -> Result<R> {
        response.json().await.map_err(|err| {
            NotekeeperError::store(
                StoreFailure::MalformedDocument,
                format!("Failed to parse Firestore {operation} response: {err}"),
            )
        })
    }
}

fn map_store_error(
    status: StatusCode,
    grpc_status: Option<&str>,
    operation: &str,
    message: &str,
) -> NotekeeperError {
    let reason = match (status, grpc_status) {
        (StatusCode::NOT_FOUND, _) | (_, Some("NOT_FOUND" | "FAILED_PRECONDITION")) => {
            StoreFailure::NotFound
        }
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, Some("PERMISSION_DENIED" | "UNAUTHENTICATED")) => StoreFailure::PermissionDenied,
        (status, _) if status.is_server_error() => StoreFailure::Network,
        _ => StoreFailure::Rejected,
    };
    NotekeeperError::store(reason, format!("Firestore {operation} failed ({status}): {message}"))
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn create_document(&self, collection: &str, fields: DocumentFields) -> Result<String> {
        let url = format!("{}/{}", self.documents_url(), collection);
        let body = json!({ "fields": to_firestore_fields(&fields) });

        let response = self.send(self.client.post(&url).json(&body), "create").await?;
        let created: RawDocument = Self::parse(response, "create").await?;
        let id = document_id(&created.name).to_string();
        debug!(collection, id = %id, "Firestore document created");
        Ok(id)
    }

    async fn query_documents(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value }
                    }
                }
            }
        });

        let response = self.send(self.client.post(&url).json(&body), "query").await?;
        let rows: Vec<QueryRow> = Self::parse(response, "query").await?;
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(RawDocument::into_document)
            .collect()
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{}/{}", self.documents_url(), collection, id);
        let request = self
            .client
            .delete(&url)
            .query(&[("currentDocument.exists", "true")]);

        self.send(request, "delete").await?;
        debug!(collection, id, "Firestore document deleted");
        Ok(())
    }
}
