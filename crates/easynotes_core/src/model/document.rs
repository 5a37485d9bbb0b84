//! Serializable snapshot of the whole note collection.
//!
//! # Responsibility
//! - Define the persisted shape: root id, note map, and child edge map.
//! - Validate structural invariants before a document is turned into a tree.
//!
//! # Invariants
//! - `notes[root]` exists and every note key equals the note's own `id`.
//! - Every edge endpoint exists in `notes`; the root is never a child.
//! - Each note is listed as a child at most once (single parent).
//! - Every note is reachable from the root, so the structure is acyclic.

use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier of the root note in a freshly seeded document.
pub const DEFAULT_ROOT_ID: &str = "ROOT";
/// Title of the root note in a freshly seeded document.
pub const DEFAULT_ROOT_TITLE: &str = "Root of all notes";

/// Structural validation failures for a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// `root` does not name an entry in `notes`.
    MissingRoot(NoteId),
    /// A `notes` key differs from the `id` stored in its value.
    KeyMismatch { key: NoteId, id: NoteId },
    /// An edge list is keyed by an unknown note.
    UnknownEdgeSource(NoteId),
    /// An edge list points at an unknown note.
    UnknownEdgeTarget { source: NoteId, target: NoteId },
    /// The root is listed as somebody's child.
    RootHasParent(NoteId),
    /// A note is listed as a child more than once.
    MultipleParents(NoteId),
    /// A note cannot be reached from the root.
    Unreachable(NoteId),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot(id) => write!(f, "root note `{id}` is missing from notes"),
            Self::KeyMismatch { key, id } => {
                write!(f, "note stored under key `{key}` has id `{id}`")
            }
            Self::UnknownEdgeSource(id) => write!(f, "edges reference unknown note `{id}`"),
            Self::UnknownEdgeTarget { source, target } => {
                write!(f, "note `{source}` lists unknown child `{target}`")
            }
            Self::RootHasParent(id) => write!(f, "root note `{id}` is listed as a child"),
            Self::MultipleParents(id) => write!(f, "note `{id}` has more than one parent"),
            Self::Unreachable(id) => write!(f, "note `{id}` is not reachable from the root"),
        }
    }
}

impl Error for DocumentError {}

/// Full persisted state of a note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Identifier of the unique parentless note.
    pub root: NoteId,
    /// All notes keyed by identifier.
    pub notes: BTreeMap<NoteId, Note>,
    /// Ordered child identifiers keyed by parent identifier.
    ///
    /// Leaf notes may be absent or map to an empty list.
    #[serde(default)]
    pub edges: BTreeMap<NoteId, Vec<NoteId>>,
}

impl Default for Document {
    /// Single root note with the default id and title, no articles.
    fn default() -> Self {
        let root = Note::with_id(DEFAULT_ROOT_ID, DEFAULT_ROOT_TITLE, Vec::new());
        let mut notes = BTreeMap::new();
        notes.insert(root.id.clone(), root);
        Self {
            root: DEFAULT_ROOT_ID.to_string(),
            notes,
            edges: BTreeMap::new(),
        }
    }
}

impl Document {
    /// Checks every structural invariant.
    ///
    /// # Errors
    /// Returns the first violation found. Checks run in a fixed order, so the
    /// reported error is deterministic for a given document.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if !self.notes.contains_key(&self.root) {
            return Err(DocumentError::MissingRoot(self.root.clone()));
        }
        for (key, note) in &self.notes {
            if *key != note.id {
                return Err(DocumentError::KeyMismatch {
                    key: key.clone(),
                    id: note.id.clone(),
                });
            }
        }

        let mut has_parent = HashSet::new();
        for (source, children) in &self.edges {
            if !self.notes.contains_key(source) {
                return Err(DocumentError::UnknownEdgeSource(source.clone()));
            }
            for target in children {
                if !self.notes.contains_key(target) {
                    return Err(DocumentError::UnknownEdgeTarget {
                        source: source.clone(),
                        target: target.clone(),
                    });
                }
                if *target == self.root {
                    return Err(DocumentError::RootHasParent(target.clone()));
                }
                if !has_parent.insert(target.as_str()) {
                    return Err(DocumentError::MultipleParents(target.clone()));
                }
            }
        }

        let mut reached = HashSet::with_capacity(self.notes.len());
        let mut stack = vec![self.root.as_str()];
        while let Some(current) = stack.pop() {
            reached.insert(current);
            if let Some(children) = self.edges.get(current) {
                stack.extend(children.iter().map(String::as_str));
            }
        }
        if let Some(orphan) = self.notes.keys().find(|id| !reached.contains(id.as_str())) {
            return Err(DocumentError::Unreachable(orphan.clone()));
        }

        Ok(())
    }

    /// Number of notes, root included.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always `false` for a valid document.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
