//! In-memory note hierarchy.

pub mod note_tree;
