//! Core domain logic for EasyNotes.
//! This crate is the single source of truth for note store invariants.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{Document, DocumentError, DEFAULT_ROOT_ID, DEFAULT_ROOT_TITLE};
pub use model::note::{generate_note_id, title_slug, Article, Note, NoteId};
pub use repo::document_repo::{
    decode_document, DocumentRepository, InMemoryDocumentRepository, JsonFileDocumentRepository,
    RepoError, RepoResult,
};
pub use service::note_service::{NoteService, StoreError, StoreErrorKind, StoreResult};
pub use tree::note_tree::{NoteTree, TreeError, TreeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
