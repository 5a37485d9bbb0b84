//! Note and article domain records.
//!
//! # Responsibility
//! - Define the content unit (`Note`) and its named text blocks (`Article`).
//! - Provide identifier generation for notes created by the store.
//!
//! # Invariants
//! - `Note::id` is stable for the lifetime of a note and never reused.
//! - Article order is insertion order; names are not required to be unique.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Opaque note identifier.
///
/// Store-generated ids are UUID v4 strings; caller-supplied ids can be any
/// non-empty string.
pub type NoteId = String;

/// Named block of text inside a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    /// Display heading. Duplicates are allowed.
    pub name: String,
    /// Markdown body.
    pub text: String,
}

impl Article {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Titled content unit holding zero or more articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Note {
    /// Unique identifier across the whole store.
    pub id: NoteId,
    /// User-facing title.
    pub title: String,
    /// Ordered article list.
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl Note {
    /// Creates a note with a freshly generated identifier.
    pub fn new(title: impl Into<String>, articles: Vec<Article>) -> Self {
        Self::with_id(generate_note_id(), title, articles)
    }

    /// Creates a note with a caller-provided identifier.
    pub fn with_id(id: impl Into<NoteId>, title: impl Into<String>, articles: Vec<Article>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            articles,
        }
    }
}

/// Generates a random 128-bit identifier rendered as a hyphenated UUID.
pub fn generate_note_id() -> NoteId {
    Uuid::new_v4().to_string()
}

/// Derives an identifier candidate from a title by dropping all whitespace.
///
/// Title-derived ids can collide; callers must go through
/// `NoteService::add_with_id`, which rejects existing keys.
pub fn title_slug(title: &str) -> NoteId {
    WHITESPACE_RE.replace_all(title, "").into_owned()
}
