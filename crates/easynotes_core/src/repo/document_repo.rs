//! Document repository contracts and JSON file implementation.
//!
//! # Responsibility
//! - Load and save the whole notes document as one unit.
//! - Keep file format and file system details inside the repository boundary.
//!
//! # Invariants
//! - A loaded document has passed `Document::validate()`.
//! - Saves replace the destination through write-then-rename; a reader never
//!   observes a partially written file.
//! - A missing backing file is reported as `RepoError::NotFound`, distinct
//!   from I/O and format failures.

use crate::model::document::{Document, DocumentError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const IN_MEMORY_LOCATION: &str = ":memory:";
const TEMP_SUFFIX: &str = "tmp";

/// Result type used by document repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from document repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Backing resource does not exist yet.
    NotFound(String),
    /// File system failure while reading or writing.
    Io { location: String, source: io::Error },
    /// Persisted bytes are not a valid notes document.
    Corrupt { location: String, message: String },
    /// In-memory document could not be encoded.
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(location) => write!(f, "notes document not found: {location}"),
            Self::Io { location, source } => {
                write!(f, "notes document I/O failure at {location}: {source}")
            }
            Self::Corrupt { location, message } => {
                write!(f, "corrupt notes document at {location}: {message}")
            }
            Self::Encode(err) => write!(f, "failed to encode notes document: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Corrupt { .. } => None,
        }
    }
}

/// Whole-document persistence contract.
pub trait DocumentRepository {
    /// Human-readable location used in logs and errors.
    fn location(&self) -> String;
    /// Reads and validates the persisted document.
    fn load(&self) -> RepoResult<Document>;
    /// Overwrites the persisted document.
    fn save(&mut self, document: &Document) -> RepoResult<()>;
}

/// JSON file backed document repository.
#[derive(Debug, Clone)]
pub struct JsonFileDocumentRepository {
    path: PathBuf,
}

impl JsonFileDocumentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> RepoError {
        RepoError::Io {
            location: self.location(),
            source,
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> RepoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }

        let temp_path = self.temp_path();
        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(err));
        }
        Ok(())
    }
}

impl DocumentRepository for JsonFileDocumentRepository {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> RepoResult<Document> {
        let started_at = Instant::now();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    "event=document_load module=repo status=missing duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Err(RepoError::NotFound(self.location()));
            }
            Err(err) => {
                error!(
                    "event=document_load module=repo status=error duration_ms={} error_code=read_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(self.io_error(err));
            }
        };

        let document = decode_document(&raw, &self.location()).map_err(|err| {
            error!(
                "event=document_load module=repo status=error duration_ms={} error_code=corrupt_document",
                started_at.elapsed().as_millis()
            );
            err
        })?;

        info!(
            "event=document_load module=repo status=ok duration_ms={} notes={} bytes={}",
            started_at.elapsed().as_millis(),
            document.len(),
            raw.len()
        );
        Ok(document)
    }

    fn save(&mut self, document: &Document) -> RepoResult<()> {
        let started_at = Instant::now();
        let encoded = serde_json::to_vec_pretty(document).map_err(RepoError::Encode)?;

        match self.write_atomically(&encoded) {
            Ok(()) => {
                info!(
                    "event=document_save module=repo status=ok duration_ms={} notes={} bytes={}",
                    started_at.elapsed().as_millis(),
                    document.len(),
                    encoded.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=document_save module=repo status=error duration_ms={} error_code=write_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Document repository that keeps the persisted copy in memory.
///
/// Mirrors file semantics: empty until the first save, validated on load.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    document: Option<Document>,
    save_count: usize,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an already persisted document. It is not validated here.
    pub fn with_document(document: Document) -> Self {
        Self {
            document: Some(document),
            save_count: 0,
        }
    }

    /// Last persisted document, if any.
    pub fn persisted(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn location(&self) -> String {
        IN_MEMORY_LOCATION.to_string()
    }

    fn load(&self) -> RepoResult<Document> {
        let document = self
            .document
            .clone()
            .ok_or_else(|| RepoError::NotFound(self.location()))?;
        document
            .validate()
            .map_err(|err| corrupt(&self.location(), &err))?;
        Ok(document)
    }

    fn save(&mut self, document: &Document) -> RepoResult<()> {
        self.document = Some(document.clone());
        self.save_count += 1;
        Ok(())
    }
}

/// Parses and validates a JSON notes document.
pub fn decode_document(raw: &str, location: &str) -> RepoResult<Document> {
    let document: Document = serde_json::from_str(raw).map_err(|err| {
        warn!(
            "event=document_decode module=repo status=error line={} column={}",
            err.line(),
            err.column()
        );
        RepoError::Corrupt {
            location: location.to_string(),
            message: err.to_string(),
        }
    })?;
    document.validate().map_err(|err| corrupt(location, &err))?;
    Ok(document)
}

fn corrupt(location: &str, err: &DocumentError) -> RepoError {
    RepoError::Corrupt {
        location: location.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_document, DocumentRepository, InMemoryDocumentRepository, RepoError};
    use crate::model::document::Document;

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode_document("{\"root\":", "test").unwrap_err();
        assert!(matches!(err, RepoError::Corrupt { .. }));
    }

    #[test]
    fn decode_rejects_schema_mismatch() {
        let err = decode_document(r#"{"root":"R","notes":[]}"#, "test").unwrap_err();
        assert!(matches!(err, RepoError::Corrupt { .. }));
    }

    #[test]
    fn decode_rejects_structurally_invalid_document() {
        let raw = r#"{"root":"R","notes":{},"edges":{}}"#;
        let err = decode_document(raw, "test").unwrap_err();
        assert!(err.to_string().contains("root note `R`"));
    }

    #[test]
    fn decode_rejects_unknown_note_field() {
        let raw = r#"{"root":"R","notes":{"R":{"id":"R","title":"Root","articels":[{"name":"a","text":"b"}]}}}"#;
        let err = decode_document(raw, "test").unwrap_err();
        assert!(matches!(err, RepoError::Corrupt { .. }));
        assert!(err.to_string().contains("articels"));
    }

    #[test]
    fn decode_rejects_unknown_document_and_article_fields() {
        let raw = r#"{"root":"R","notes":{"R":{"id":"R","title":"Root"}},"egdes":{}}"#;
        assert!(matches!(
            decode_document(raw, "test"),
            Err(RepoError::Corrupt { .. })
        ));

        let raw = r#"{"root":"R","notes":{"R":{"id":"R","title":"Root","articles":[{"name":"a","body":"b"}]}}}"#;
        assert!(matches!(
            decode_document(raw, "test"),
            Err(RepoError::Corrupt { .. })
        ));
    }

    #[test]
    fn decode_accepts_document_without_edges_field() {
        let raw = r#"{"root":"R","notes":{"R":{"id":"R","title":"Root"}}}"#;
        let document = decode_document(raw, "test").unwrap();
        assert_eq!(document.len(), 1);
        assert!(document.edges.is_empty());
    }

    #[test]
    fn in_memory_repo_starts_missing_and_counts_saves() {
        let mut repo = InMemoryDocumentRepository::new();
        assert!(matches!(repo.load(), Err(RepoError::NotFound(_))));

        repo.save(&Document::default()).unwrap();
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.load().unwrap(), Document::default());
    }
}
