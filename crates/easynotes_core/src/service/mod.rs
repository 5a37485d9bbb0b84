//! Core use-case services.
//!
//! # Responsibility
//! - Combine the in-memory note tree with document persistence.
//! - Keep presentation layers decoupled from tree and storage details.

pub mod note_service;
