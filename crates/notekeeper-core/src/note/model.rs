//! Note domain model and its document mapping.

use crate::error::{NotekeeperError, Result, StoreFailure};
use crate::note::gateway::{Document, DocumentFields};
use crate::session::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Collection that holds every user's notes.
pub const NOTES_COLLECTION: &str = "notes";
/// Document field carrying the note body.
pub const TEXT_FIELD: &str = "text";
/// Document field carrying the owner's user id.
pub const OWNER_FIELD: &str = "userId";

/// Identifier assigned by the document store when a note is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A short text note as confirmed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub owner_id: UserId,
    /// Creation time reported by the store, if it reports one. Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Reads a note out of a `notes` document.
    pub fn from_document(document: Document) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            match document.fields.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(NotekeeperError::store(
                    StoreFailure::MalformedDocument,
                    format!("document '{}' has a non-string '{}'", document.id, name),
                )),
                None => Err(NotekeeperError::store(
                    StoreFailure::MalformedDocument,
                    format!("document '{}' is missing '{}'", document.id, name),
                )),
            }
        };

        let text = field(TEXT_FIELD)?;
        let owner_id = UserId::new(field(OWNER_FIELD)?);
        Ok(Self {
            id: NoteId::new(document.id),
            text,
            owner_id,
            created_at: document.created_at,
        })
    }
}

/// A note that has passed local validation but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    text: String,
    owner_id: UserId,
}

impl NewNote {
    /// Validates and trims `text`. Blank text never reaches the store.
    pub fn new(owner_id: &UserId, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(NotekeeperError::validation("text", "must not be empty"));
        }
        Ok(Self {
            text: trimmed.to_string(),
            owner_id: owner_id.clone(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_fields(self) -> DocumentFields {
        let mut fields = DocumentFields::new();
        fields.insert(TEXT_FIELD.to_string(), Value::String(self.text));
        fields.insert(
            OWNER_FIELD.to_string(),
            Value::String(self.owner_id.as_str().to_string()),
        );
        fields
    }
}

/// The synchronizer's view of one user's notes.
///
/// `owner` is `None` until the first successful refresh and again after
/// [`NotesSynchronizer::clear`](crate::note::NotesSynchronizer::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteList {
    pub owner: Option<UserId>,
    pub notes: Vec<Note>,
}

impl NoteList {
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.iter().any(|n| &n.id == id)
    }
}
