//! Document model for the note store.
//!
//! # Responsibility
//! - Define the records persisted in the notes JSON document.
//! - Own structural validation of a loaded document.
//!
//! # Invariants
//! - Every note is identified by a unique `NoteId`.
//! - A valid document is a rooted out-tree: one root, single parents, no cycles.

pub mod document;
pub mod note;
