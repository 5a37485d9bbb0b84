//! Note store use-case service.
//!
//! # Responsibility
//! - Own the in-memory note tree and its backing document repository.
//! - Expose lookup, traversal, and mutation entry points to presentation code.
//! - Seed and persist a default document when the backing store is empty.
//!
//! # Invariants
//! - Mutations only touch memory; nothing is persisted until `save()`.
//! - The root note is never removed or moved.
//! - The service holds no "current note" state; callers pass ids explicitly.
//!
//! # Concurrency
//! - Single owner. Concurrent writers must wrap load-mutate-save in one
//!   external lock; the document carries no version, so the last save wins.

use crate::model::document::{Document, DocumentError};
use crate::model::note::{generate_note_id, Article, Note, NoteId};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use crate::tree::note_tree::{NoteTree, TreeError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type used by note store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse error category for callers that report by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    IndexOutOfRange,
    InvalidOperation,
    CorruptDocument,
    Io,
}

/// Errors from note store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Note id is absent. Recoverable by the caller.
    NotFound(NoteId),
    /// Article position is not valid for the note.
    IndexOutOfRange { id: NoteId, index: usize, len: usize },
    /// Structurally disallowed mutation; the store is unchanged.
    InvalidOperation(String),
    /// Persisted document is malformed. Fatal at startup.
    CorruptDocument(String),
    /// Persistence failure; the in-memory store is unaffected.
    Io(RepoError),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::IndexOutOfRange { .. } => StoreErrorKind::IndexOutOfRange,
            Self::InvalidOperation(_) => StoreErrorKind::InvalidOperation,
            Self::CorruptDocument(_) => StoreErrorKind::CorruptDocument,
            Self::Io(_) => StoreErrorKind::Io,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::IndexOutOfRange { id, index, len } => write!(
                f,
                "article index {index} out of range for note {id} with {len} articles"
            ),
            Self::InvalidOperation(message) => write!(f, "invalid operation: {message}"),
            Self::CorruptDocument(message) => write!(f, "corrupt notes document: {message}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::NoteNotFound(id) => Self::NotFound(id),
            TreeError::IndexOutOfRange { id, index, len } => {
                Self::IndexOutOfRange { id, index, len }
            }
            TreeError::InvalidOperation(message) => Self::InvalidOperation(message),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Corrupt { location, message } => {
                Self::CorruptDocument(format!("{location}: {message}"))
            }
            other => Self::Io(other),
        }
    }
}

impl From<DocumentError> for StoreError {
    fn from(value: DocumentError) -> Self {
        Self::CorruptDocument(value.to_string())
    }
}

/// Note store facade over a document repository.
pub struct NoteService<R: DocumentRepository> {
    repo: R,
    tree: NoteTree,
}

impl<R: DocumentRepository> NoteService<R> {
    /// Loads the store from `repo`, seeding a default document when absent.
    ///
    /// # Side effects
    /// - Saves the default document immediately when the repository is empty,
    ///   so the next load is deterministic.
    ///
    /// # Errors
    /// - `CorruptDocument` when persisted data is malformed.
    /// - `Io` for read failures or a failed seed save.
    pub fn open(mut repo: R) -> StoreResult<Self> {
        let tree = load_or_seed(&mut repo)?;
        Ok(Self { repo, tree })
    }

    /// Replaces in-memory state with the repository's current document.
    ///
    /// Unsaved mutations are discarded. On error the store is unchanged.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.tree = load_or_seed(&mut self.repo)?;
        Ok(())
    }

    /// Persists the whole store.
    pub fn save(&mut self) -> StoreResult<()> {
        let document = self.tree.to_document();
        self.repo.save(&document).map_err(|err| {
            error!(
                "event=store_save module=store status=error notes={} error={}",
                document.len(),
                err
            );
            StoreError::from(err)
        })
    }

    /// Replaces every note by a fresh default document, in memory only.
    pub fn reset(&mut self) -> StoreResult<()> {
        let removed = self.tree.len();
        self.tree = NoteTree::from_document(Document::default())?;
        warn!("event=store_reset module=store status=ok removed_notes={removed}");
        Ok(())
    }

    /// Snapshot of the whole store in persisted form.
    pub fn document(&self) -> Document {
        self.tree.to_document()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tree.contains(id)
    }

    /// Iterates over all note ids in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = &NoteId> {
        self.tree.ids()
    }

    pub fn root(&self) -> &Note {
        self.tree.root()
    }

    pub fn root_id(&self) -> &NoteId {
        self.tree.root_id()
    }

    pub fn get(&self, id: &str) -> StoreResult<&Note> {
        Ok(self.tree.get(id)?)
    }

    /// Direct children in insertion order; empty for leaves.
    pub fn children(&self, id: &str) -> StoreResult<Vec<&Note>> {
        Ok(self.tree.children(id)?)
    }

    /// Parent note; `None` only for the root.
    pub fn parent(&self, id: &str) -> StoreResult<Option<&Note>> {
        Ok(self.tree.parent(id)?)
    }

    /// Notes from the root down to the parent of `id`.
    pub fn ancestors(&self, id: &str) -> StoreResult<Vec<&Note>> {
        Ok(self.tree.ancestors(id)?)
    }

    /// `id` followed by all descendants in pre-order.
    pub fn subtree_ids(&self, id: &str) -> StoreResult<Vec<NoteId>> {
        Ok(self.tree.subtree_ids(id)?)
    }

    /// Creates a note with a generated id as the last child of `parent`.
    ///
    /// # Errors
    /// - `NotFound` when `parent` does not exist.
    /// - `InvalidOperation` if the generated id is already taken.
    pub fn add(
        &mut self,
        parent: &str,
        title: impl Into<String>,
        articles: Vec<Article>,
    ) -> StoreResult<Note> {
        self.insert(parent, Note::with_id(generate_note_id(), title, articles))
    }

    /// Creates a note with a caller-chosen id as the last child of `parent`.
    ///
    /// # Errors
    /// - `NotFound` when `parent` does not exist.
    /// - `InvalidOperation` when `id` is empty or already used.
    pub fn add_with_id(
        &mut self,
        parent: &str,
        id: impl Into<NoteId>,
        title: impl Into<String>,
        articles: Vec<Article>,
    ) -> StoreResult<Note> {
        self.insert(parent, Note::with_id(id, title, articles))
    }

    /// Removes `id` and its whole subtree; returns removed ids, `id` last.
    ///
    /// # Errors
    /// - `InvalidOperation` for the root; the store is unchanged.
    /// - `NotFound` when `id` does not exist.
    pub fn remove_subtree(&mut self, id: &str) -> StoreResult<Vec<NoteId>> {
        let started_at = Instant::now();
        match self.tree.remove_subtree(id) {
            Ok(removed) => {
                info!(
                    "event=note_remove module=store status=ok removed={} duration_ms={}",
                    removed.len(),
                    started_at.elapsed().as_millis()
                );
                debug!("event=note_remove module=store status=ok note_id={id}");
                Ok(removed)
            }
            Err(err) => {
                let err = StoreError::from(err);
                warn!(
                    "event=note_remove module=store status=rejected kind={:?}",
                    err.kind()
                );
                debug!("event=note_remove module=store status=rejected note_id={id} error={err}");
                Err(err)
            }
        }
    }

    /// Re-attaches `id` as the last child of `new_parent`.
    pub fn move_note(&mut self, id: &str, new_parent: &str) -> StoreResult<()> {
        self.tree.move_note(id, new_parent)?;
        info!("event=note_move module=store status=ok");
        debug!("event=note_move module=store status=ok note_id={id} parent_id={new_parent}");
        Ok(())
    }

    pub fn rename_note(&mut self, id: &str, title: impl Into<String>) -> StoreResult<()> {
        self.tree.rename_note(id, title)?;
        debug!("event=note_rename module=store status=ok note_id={id}");
        Ok(())
    }

    pub fn add_article(&mut self, id: &str, article: Article) -> StoreResult<()> {
        self.tree.add_article(id, article)?;
        debug!("event=article_add module=store status=ok note_id={id}");
        Ok(())
    }

    /// Replaces the article at `index` (zero-based, positional).
    pub fn update_article(&mut self, id: &str, index: usize, article: Article) -> StoreResult<()> {
        self.tree.update_article(id, index, article)?;
        debug!("event=article_update module=store status=ok note_id={id} index={index}");
        Ok(())
    }

    pub fn remove_article(&mut self, id: &str, index: usize) -> StoreResult<Article> {
        let removed = self.tree.remove_article(id, index)?;
        debug!("event=article_remove module=store status=ok note_id={id} index={index}");
        Ok(removed)
    }

    fn insert(&mut self, parent: &str, note: Note) -> StoreResult<Note> {
        match self.tree.insert_child(parent, note) {
            Ok(created) => {
                info!("event=note_add module=store status=ok");
                debug!(
                    "event=note_add module=store status=ok note_id={} parent_id={}",
                    created.id, parent
                );
                Ok(created.clone())
            }
            Err(err) => {
                let err = StoreError::from(err);
                warn!("event=note_add module=store status=rejected kind={:?}", err.kind());
                debug!("event=note_add module=store status=rejected parent_id={parent} error={err}");
                Err(err)
            }
        }
    }
}

fn load_or_seed<R: DocumentRepository>(repo: &mut R) -> StoreResult<NoteTree> {
    let started_at = Instant::now();
    let (document, seeded) = match repo.load() {
        Ok(document) => (document, false),
        Err(RepoError::NotFound(location)) => {
            info!("event=store_seed module=store status=start location={location}");
            let document = Document::default();
            repo.save(&document)?;
            (document, true)
        }
        Err(err) => {
            let err = StoreError::from(err);
            error!(
                "event=store_open module=store status=error duration_ms={} kind={:?}",
                started_at.elapsed().as_millis(),
                err.kind()
            );
            debug!("event=store_open module=store status=error error={err}");
            return Err(err);
        }
    };

    let tree = NoteTree::from_document(document)?;
    info!(
        "event=store_open module=store status=ok duration_ms={} notes={} seeded={}",
        started_at.elapsed().as_millis(),
        tree.len(),
        seeded
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::{NoteService, StoreError, StoreErrorKind};
    use crate::model::document::{Document, DEFAULT_ROOT_ID};
    use crate::model::note::{Article, Note};
    use crate::repo::document_repo::InMemoryDocumentRepository;

    fn open_empty() -> NoteService<InMemoryDocumentRepository> {
        NoteService::open(InMemoryDocumentRepository::new()).unwrap()
    }

    #[test]
    fn open_seeds_and_persists_default_document() {
        let service = open_empty();
        assert_eq!(service.len(), 1);
        assert_eq!(service.root_id(), DEFAULT_ROOT_ID);
        assert_eq!(service.repository().save_count(), 1);
        assert_eq!(
            service.repository().persisted(),
            Some(&Document::default())
        );
    }

    #[test]
    fn open_maps_invalid_document_to_corrupt() {
        let mut document = Document::default();
        document.root = "missing".to_string();
        let err = NoteService::open(InMemoryDocumentRepository::with_document(document))
            .err()
            .unwrap();
        assert_eq!(err.kind(), StoreErrorKind::CorruptDocument);
    }

    #[test]
    fn mutations_are_not_persisted_until_save() {
        let mut service = open_empty();
        let note = service.add(DEFAULT_ROOT_ID, "Draft", Vec::new()).unwrap();
        assert_eq!(service.repository().persisted().unwrap().len(), 1);

        service.save().unwrap();
        let persisted = service.repository().persisted().unwrap();
        assert!(persisted.notes.contains_key(&note.id));
        assert_eq!(service.repository().save_count(), 2);
    }

    #[test]
    fn reload_discards_unsaved_changes() {
        let mut service = open_empty();
        service.add(DEFAULT_ROOT_ID, "Unsaved", Vec::new()).unwrap();
        service.reload().unwrap();
        assert_eq!(service.len(), 1);
    }

    #[test]
    fn reset_leaves_only_default_root() {
        let mut service = open_empty();
        let parent = service.add(DEFAULT_ROOT_ID, "P", Vec::new()).unwrap();
        service.add(&parent.id, "C", Vec::new()).unwrap();
        service.rename_note(DEFAULT_ROOT_ID, "Renamed").unwrap();

        service.reset().unwrap();
        assert_eq!(service.document(), Document::default());
    }

    #[test]
    fn add_with_id_rejects_existing_key() {
        let mut service = open_empty();
        service
            .add_with_id(DEFAULT_ROOT_ID, "Groceries", "Groceries", Vec::new())
            .unwrap();
        let err = service
            .add_with_id(DEFAULT_ROOT_ID, "Groceries", "Other", Vec::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation(_)));
        assert_eq!(service.get("Groceries").unwrap().title, "Groceries");
        assert_eq!(service.children(DEFAULT_ROOT_ID).unwrap().len(), 1);
    }

    #[test]
    fn error_kinds_match_variants() {
        let mut service = open_empty();
        assert_eq!(
            service.get("nope").unwrap_err().kind(),
            StoreErrorKind::NotFound
        );
        assert_eq!(
            service
                .update_article(DEFAULT_ROOT_ID, 0, Article::new("a", "b"))
                .unwrap_err()
                .kind(),
            StoreErrorKind::IndexOutOfRange
        );
        assert_eq!(
            service.remove_subtree(DEFAULT_ROOT_ID).unwrap_err().kind(),
            StoreErrorKind::InvalidOperation
        );
    }

    #[test]
    fn add_returns_created_note_with_articles() {
        let mut service = open_empty();
        let created = service
            .add(
                DEFAULT_ROOT_ID,
                "Recipes",
                vec![Article::new("Soup", "Boil water.")],
            )
            .unwrap();
        let stored: &Note = service.get(&created.id).unwrap();
        assert_eq!(stored, &created);
        assert_eq!(service.parent(&created.id).unwrap().unwrap().id, DEFAULT_ROOT_ID);
    }
}
