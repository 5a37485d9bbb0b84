//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the whole-document load/save contract.
//! - Isolate JSON encoding and file replacement details from the store service.
//!
//! # Invariants
//! - Repository loads reject documents failing `Document::validate()`.
//! - Repository APIs return semantic errors (`NotFound`, `Corrupt`) in
//!   addition to file system errors.

pub mod document_repo;
