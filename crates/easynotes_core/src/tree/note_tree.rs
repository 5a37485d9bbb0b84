//! In-memory note hierarchy indexed by identifier.
//!
//! # Responsibility
//! - Build a parent-indexed arena from a validated `Document`.
//! - Provide O(1) lookup and O(children) traversal.
//! - Apply structural and content mutations without leaving dangling edges.
//!
//! # Invariants
//! - The root entry is never removed and never has a parent.
//! - `entries[c].parent == Some(p)` iff `c` is listed in `entries[p].children`.
//! - Child order is insertion order; no mutation reorders siblings implicitly.
//! - Subtree walks use an explicit worklist, so depth is bounded by heap only.

use crate::model::document::{Document, DocumentError};
use crate::model::note::{Article, Note, NoteId};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by note tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from note tree lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Article position is outside the note's article list.
    IndexOutOfRange { id: NoteId, index: usize, len: usize },
    /// Mutation is structurally disallowed.
    InvalidOperation(String),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::IndexOutOfRange { id, index, len } => write!(
                f,
                "article index {index} out of range for note {id} with {len} articles"
            ),
            Self::InvalidOperation(message) => write!(f, "invalid operation: {message}"),
        }
    }
}

impl Error for TreeError {}

#[derive(Debug, Clone)]
struct NoteEntry {
    note: Note,
    parent: Option<NoteId>,
    children: Vec<NoteId>,
}

/// Arena of notes with a separately maintained child index.
#[derive(Debug, Clone)]
pub struct NoteTree {
    root: NoteId,
    entries: HashMap<NoteId, NoteEntry>,
}

impl NoteTree {
    /// Builds a tree from a document after validating it.
    ///
    /// # Errors
    /// Returns the first structural violation reported by `Document::validate`.
    pub fn from_document(document: Document) -> Result<Self, DocumentError> {
        document.validate()?;

        let Document { root, notes, edges } = document;
        let mut entries: HashMap<NoteId, NoteEntry> = notes
            .into_iter()
            .map(|(id, note)| {
                (
                    id,
                    NoteEntry {
                        note,
                        parent: None,
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        for (source, children) in edges {
            for child in &children {
                if let Some(entry) = entries.get_mut(child) {
                    entry.parent = Some(source.clone());
                }
            }
            if let Some(entry) = entries.get_mut(&source) {
                entry.children = children;
            }
        }

        Ok(Self { root, entries })
    }

    /// Snapshots the tree as a document. Leaf notes get no edge entry.
    pub fn to_document(&self) -> Document {
        let mut notes = BTreeMap::new();
        let mut edges = BTreeMap::new();
        for (id, entry) in &self.entries {
            notes.insert(id.clone(), entry.note.clone());
            if !entry.children.is_empty() {
                edges.insert(id.clone(), entry.children.clone());
            }
        }
        Document {
            root: self.root.clone(),
            notes,
            edges,
        }
    }

    pub fn root_id(&self) -> &NoteId {
        &self.root
    }

    /// Returns the unique parentless note.
    pub fn root(&self) -> &Note {
        // Root entry is present from construction and never removed.
        &self.entries[&self.root].note
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterates over all identifiers in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = &NoteId> {
        self.entries.keys()
    }

    pub fn get(&self, id: &str) -> TreeResult<&Note> {
        self.entry(id).map(|entry| &entry.note)
    }

    /// Lists direct children in insertion order.
    pub fn children(&self, id: &str) -> TreeResult<Vec<&Note>> {
        let entry = self.entry(id)?;
        Ok(entry
            .children
            .iter()
            .filter_map(|child| self.entries.get(child))
            .map(|child| &child.note)
            .collect())
    }

    /// Returns the parent note, or `None` for the root.
    pub fn parent(&self, id: &str) -> TreeResult<Option<&Note>> {
        let entry = self.entry(id)?;
        Ok(entry
            .parent
            .as_deref()
            .and_then(|parent| self.entries.get(parent))
            .map(|parent| &parent.note))
    }

    /// Lists ancestors from the root down to the direct parent of `id`.
    pub fn ancestors(&self, id: &str) -> TreeResult<Vec<&Note>> {
        let mut cursor = self.entry(id)?.parent.as_deref();
        let mut path = Vec::new();
        while let Some(current) = cursor {
            let entry = self.entry(current)?;
            path.push(&entry.note);
            cursor = entry.parent.as_deref();
        }
        path.reverse();
        Ok(path)
    }

    /// Lists `id` and all of its descendants in pre-order.
    pub fn subtree_ids(&self, id: &str) -> TreeResult<Vec<NoteId>> {
        let start = self.entry(id)?;
        let mut ordered = Vec::new();
        let mut stack = vec![(start.note.id.as_str(), start)];
        while let Some((current, entry)) = stack.pop() {
            ordered.push(current.to_string());
            for child in entry.children.iter().rev() {
                if let Some(child_entry) = self.entries.get(child) {
                    stack.push((child.as_str(), child_entry));
                }
            }
        }
        Ok(ordered)
    }

    /// Attaches `note` as the last child of `parent`.
    ///
    /// # Errors
    /// - `NoteNotFound` when `parent` does not exist.
    /// - `InvalidOperation` when the note id is empty or already taken.
    pub fn insert_child(&mut self, parent: &str, note: Note) -> TreeResult<&Note> {
        if !self.entries.contains_key(parent) {
            return Err(TreeError::NoteNotFound(parent.to_string()));
        }
        if note.id.is_empty() {
            return Err(TreeError::InvalidOperation(
                "note id must not be empty".to_string(),
            ));
        }
        if self.entries.contains_key(&note.id) {
            return Err(TreeError::InvalidOperation(format!(
                "note id already exists: {}",
                note.id
            )));
        }

        let id = note.id.clone();
        self.entry_mut(parent)?.children.push(id.clone());
        let entry = self.entries.entry(id).or_insert(NoteEntry {
            note,
            parent: Some(parent.to_string()),
            children: Vec::new(),
        });
        Ok(&entry.note)
    }

    /// Removes `id` together with every note reachable through child edges.
    ///
    /// Descendants are dropped bottom-up before `id` is detached from its
    /// parent. Returns removed identifiers in removal order, `id` last.
    ///
    /// # Errors
    /// - `InvalidOperation` when `id` is the root; the tree is unchanged.
    /// - `NoteNotFound` when `id` does not exist.
    pub fn remove_subtree(&mut self, id: &str) -> TreeResult<Vec<NoteId>> {
        if id == self.root {
            return Err(TreeError::InvalidOperation(
                "the root note cannot be removed".to_string(),
            ));
        }
        let mut removal_order = self.subtree_ids(id)?;
        removal_order.reverse();

        let mut parent = None;
        for current in &removal_order {
            if let Some(entry) = self.entries.remove(current) {
                if current == id {
                    parent = entry.parent;
                }
            }
        }
        if let Some(parent) = parent {
            self.entry_mut(&parent)?.children.retain(|child| child != id);
        }
        Ok(removal_order)
    }

    /// Re-attaches `id` as the last child of `new_parent`.
    ///
    /// # Errors
    /// - `NoteNotFound` when either note does not exist.
    /// - `InvalidOperation` when `id` is the root or `new_parent` lies inside
    ///   the subtree of `id`.
    pub fn move_note(&mut self, id: &str, new_parent: &str) -> TreeResult<()> {
        let old_parent = self
            .entry(id)?
            .parent
            .clone()
            .ok_or_else(|| TreeError::InvalidOperation("the root note cannot be moved".to_string()))?;
        if self.is_in_subtree(new_parent, id)? {
            return Err(TreeError::InvalidOperation(format!(
                "moving {id} under {new_parent} would create a cycle"
            )));
        }

        self.entry_mut(&old_parent)?
            .children
            .retain(|child| child != id);
        self.entry_mut(new_parent)?.children.push(id.to_string());
        self.entry_mut(id)?.parent = Some(new_parent.to_string());
        Ok(())
    }

    pub fn rename_note(&mut self, id: &str, title: impl Into<String>) -> TreeResult<()> {
        self.entry_mut(id)?.note.title = title.into();
        Ok(())
    }

    pub fn add_article(&mut self, id: &str, article: Article) -> TreeResult<()> {
        self.entry_mut(id)?.note.articles.push(article);
        Ok(())
    }

    /// Replaces the article at `index`. Positional: names are not consulted.
    pub fn update_article(&mut self, id: &str, index: usize, article: Article) -> TreeResult<()> {
        let slot = self.article_slot(id, index)?;
        *slot = article;
        Ok(())
    }

    /// Removes and returns the article at `index`, shifting later ones down.
    pub fn remove_article(&mut self, id: &str, index: usize) -> TreeResult<Article> {
        self.article_slot(id, index)?;
        Ok(self.entry_mut(id)?.note.articles.remove(index))
    }

    fn article_slot(&mut self, id: &str, index: usize) -> TreeResult<&mut Article> {
        let articles = &mut self.entry_mut(id)?.note.articles;
        let len = articles.len();
        articles
            .get_mut(index)
            .ok_or_else(|| TreeError::IndexOutOfRange {
                id: id.to_string(),
                index,
                len,
            })
    }

    /// Whether `candidate` equals `ancestor` or descends from it.
    fn is_in_subtree(&self, candidate: &str, ancestor: &str) -> TreeResult<bool> {
        let mut cursor = Some(self.entry(candidate)?.note.id.as_str());
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            cursor = self.entry(current)?.parent.as_deref();
        }
        Ok(false)
    }

    fn entry(&self, id: &str) -> TreeResult<&NoteEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| TreeError::NoteNotFound(id.to_string()))
    }

    fn entry_mut(&mut self, id: &str) -> TreeResult<&mut NoteEntry> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| TreeError::NoteNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteTree, TreeError};
    use crate::model::document::{Document, DEFAULT_ROOT_ID};
    use crate::model::note::{Article, Note};

    fn tree() -> NoteTree {
        NoteTree::from_document(Document::default()).unwrap()
    }

    fn add(tree: &mut NoteTree, parent: &str, id: &str) {
        tree.insert_child(parent, Note::with_id(id, id.to_uppercase(), Vec::new()))
            .unwrap();
    }

    fn child_ids(tree: &NoteTree, id: &str) -> Vec<String> {
        tree.children(id)
            .unwrap()
            .into_iter()
            .map(|note| note.id.clone())
            .collect()
    }

    #[test]
    fn insert_child_appends_and_links_parent() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "x");
        add(&mut tree, DEFAULT_ROOT_ID, "y");
        add(&mut tree, "x", "x1");

        assert_eq!(child_ids(&tree, DEFAULT_ROOT_ID), vec!["x", "y"]);
        assert_eq!(tree.parent("x1").unwrap().unwrap().id, "x");
        assert!(tree.parent(DEFAULT_ROOT_ID).unwrap().is_none());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn insert_child_rejects_duplicate_and_empty_ids() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "x");

        let err = tree
            .insert_child(DEFAULT_ROOT_ID, Note::with_id("x", "again", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidOperation(_)));
        let err = tree
            .insert_child("x", Note::with_id(DEFAULT_ROOT_ID, "root clash", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidOperation(_)));
        let err = tree
            .insert_child("x", Note::with_id("", "blank", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidOperation(_)));
        assert_eq!(child_ids(&tree, "x"), Vec::<String>::new());
    }

    #[test]
    fn remove_subtree_returns_bottom_up_order() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "p");
        add(&mut tree, "p", "c1");
        add(&mut tree, "c1", "g1");
        add(&mut tree, "p", "c2");

        let removed = tree.remove_subtree("p").unwrap();
        assert_eq!(removed.last().map(String::as_str), Some("p"));
        let pos = |id: &str| removed.iter().position(|item| item == id).unwrap();
        assert!(pos("g1") < pos("c1"));
        assert_eq!(removed.len(), 4);
        assert_eq!(tree.len(), 1);
        assert!(child_ids(&tree, DEFAULT_ROOT_ID).is_empty());
    }

    #[test]
    fn ancestors_and_subtree_ids_follow_structure() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "a");
        add(&mut tree, "a", "b");
        add(&mut tree, "b", "c");
        add(&mut tree, "a", "d");

        let path: Vec<_> = tree
            .ancestors("c")
            .unwrap()
            .into_iter()
            .map(|note| note.id.as_str())
            .collect();
        assert_eq!(path, vec![DEFAULT_ROOT_ID, "a", "b"]);
        assert!(tree.ancestors(DEFAULT_ROOT_ID).unwrap().is_empty());
        assert_eq!(tree.subtree_ids("a").unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn move_note_rejects_cycles_and_root() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "a");
        add(&mut tree, "a", "b");
        add(&mut tree, DEFAULT_ROOT_ID, "c");

        assert!(matches!(
            tree.move_note("a", "b"),
            Err(TreeError::InvalidOperation(_))
        ));
        assert!(matches!(
            tree.move_note("a", "a"),
            Err(TreeError::InvalidOperation(_))
        ));
        assert!(matches!(
            tree.move_note(DEFAULT_ROOT_ID, "c"),
            Err(TreeError::InvalidOperation(_))
        ));

        tree.move_note("b", "c").unwrap();
        assert!(child_ids(&tree, "a").is_empty());
        assert_eq!(child_ids(&tree, "c"), vec!["b"]);
        assert_eq!(tree.parent("b").unwrap().unwrap().id, "c");
        assert!(tree.to_document().validate().is_ok());
    }

    #[test]
    fn article_operations_are_positional() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "n");
        tree.add_article("n", Article::new("dup", "first")).unwrap();
        tree.add_article("n", Article::new("dup", "second")).unwrap();

        tree.update_article("n", 1, Article::new("dup", "changed"))
            .unwrap();
        let articles = &tree.get("n").unwrap().articles;
        assert_eq!(articles[0].text, "first");
        assert_eq!(articles[1].text, "changed");

        let err = tree
            .update_article("n", 2, Article::new("x", "y"))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::IndexOutOfRange {
                id: "n".to_string(),
                index: 2,
                len: 2
            }
        );

        let removed = tree.remove_article("n", 0).unwrap();
        assert_eq!(removed.text, "first");
        assert_eq!(tree.get("n").unwrap().articles.len(), 1);
        assert!(tree.remove_article("n", 1).is_err());
    }

    #[test]
    fn to_document_round_trips_through_from_document() {
        let mut tree = tree();
        add(&mut tree, DEFAULT_ROOT_ID, "a");
        add(&mut tree, "a", "b");
        add(&mut tree, DEFAULT_ROOT_ID, "c");

        let document = tree.to_document();
        assert!(!document.edges.contains_key("b"));
        let rebuilt = NoteTree::from_document(document.clone()).unwrap();
        assert_eq!(rebuilt.to_document(), document);
        assert_eq!(child_ids(&rebuilt, DEFAULT_ROOT_ID), vec!["a", "c"]);
    }
}
