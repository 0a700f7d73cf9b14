//! Note domain module.
//!
//! - `model`: `Note`, `NoteId`, `NewNote`, `NoteList` and the `notes` document mapping
//! - `gateway`: `DocumentStore` trait for the hosted document database
//! - `synchronizer`: `NotesSynchronizer`, the store-confirmed in-memory note list

mod gateway;
mod model;
mod synchronizer;

pub use gateway::{Document, DocumentFields, DocumentStore};
pub use model::{NOTES_COLLECTION, NewNote, Note, NoteId, NoteList, OWNER_FIELD, TEXT_FIELD};
pub use synchronizer::NotesSynchronizer;
