//! JSON-file course store.
//!
//! Holds the authoritative course tree and rewrites the course document
//! after every mutation. Used as the outline's remote service.

use super::service::OutlineService;
use crate::error::{Error, Result};
use crate::outline::{Category, Node, VisibilityState};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffix of the temporary file used during atomic writes.
const TEMP_SUFFIX: &str = "tmp";

/// The course tree, optionally bound to a document on disk.
#[derive(Debug, Clone)]
pub struct CourseStore {
    root: Node,
    path: Option<PathBuf>,
    next_suffix: u64,
    /// Modification time of the document as last read or written
    loaded_at: Option<SystemTime>,
}

impl CourseStore {
    /// A store that lives only in memory.
    pub fn in_memory(root: Node) -> Self {
        let next_suffix = next_free_suffix(&root);
        Self {
            root,
            path: None,
            next_suffix,
            loaded_at: None,
        }
    }

    /// Load a course document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let root = read_course(&path)?;
        info!(
            "Opened course '{}' ({} items) from {}",
            root.display_name,
            root.locators().len(),
            path.display()
        );
        let mut store = Self::in_memory(root);
        store.loaded_at = modified_time(&path);
        store.path = Some(path);
        Ok(store)
    }

    /// Start a new, empty course document at `path`.
    pub fn create(path: impl Into<PathBuf>, display_name: &str) -> Result<Self> {
        let mut store = Self::in_memory(Node::new("course", Category::Course, display_name));
        store.path = Some(path.into());
        store.persist_and_track()?;
        Ok(store)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let save_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::StorageSave {
            path: path.clone(),
            source: e,
        };
        let json = serde_json::to_string_pretty(&self.root).map_err(|e| save_err(Box::new(e)))?;
        let temp_path = path.with_extension(TEMP_SUFFIX);
        fs::write(&temp_path, json).map_err(|e| save_err(Box::new(e)))?;
        fs::rename(&temp_path, path).map_err(|e| save_err(Box::new(e)))?;
        debug!("Course document written to {}", path.display());
        Ok(())
    }

    fn persist_and_track(&mut self) -> Result<()> {
        self.persist()?;
        if let Some(path) = &self.path {
            self.loaded_at = modified_time(path);
        }
        Ok(())
    }

    /// Re-read the document if it was modified since it was last read or
    /// written by this store.
    pub fn reload_if_changed(&mut self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        let modified = modified_time(path);
        if modified.is_none() || modified == self.loaded_at {
            return Ok(false);
        }
        let root = read_course(path)?;
        info!("Course document {} changed on disk, reloaded", path.display());
        self.next_suffix = self.next_suffix.max(next_free_suffix(&root));
        self.root = root;
        self.loaded_at = modified;
        Ok(true)
    }

    fn next_locator(&mut self, category: Category) -> String {
        let locator = format!("{}-{}", category.as_str(), self.next_suffix);
        self.next_suffix += 1;
        locator
    }

    /// Deep copy of `node` with fresh locators for the whole subtree.
    fn copy_with_new_locators(&mut self, node: &Node) -> Node {
        let id = self.next_locator(node.category);
        let fresh: Vec<Node> = node
            .children()
            .iter()
            .map(|child| self.copy_with_new_locators(child))
            .collect();

        let mut copy = node.clone();
        copy.id = id;
        copy.visibility_state = VisibilityState::Unscheduled;
        if let Some(children) = copy.children_mut() {
            *children = fresh;
        }
        copy
    }
}

fn read_course(path: &Path) -> Result<Node> {
    let load_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::StorageLoad {
        path: path.to_path_buf(),
        source: e,
    };
    let contents = fs::read_to_string(path).map_err(|e| load_err(Box::new(e)))?;
    let root: Node = serde_json::from_str(&contents).map_err(|e| load_err(Box::new(e)))?;
    if root.category != Category::Course {
        return Err(Error::InvalidOperation(format!(
            "'{}' does not contain a course (root category is {})",
            path.display(),
            root.category.as_str()
        )));
    }
    if !root.is_well_formed() {
        return Err(Error::InvalidOperation(format!(
            "'{}' has nodes whose children do not match their category",
            path.display()
        )));
    }
    Ok(root)
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// One past the largest numeric `-<n>` suffix among existing locators.
fn next_free_suffix(root: &Node) -> u64 {
    root.locators()
        .iter()
        .filter_map(|locator| locator.rsplit_once('-'))
        .filter_map(|(_, suffix)| suffix.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
}

impl OutlineService for CourseStore {
    fn fetch(&mut self, locator: &str) -> Result<Node> {
        self.reload_if_changed()?;
        self.root
            .find(locator)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound(locator.to_string()))
    }

    fn create_child(
        &mut self,
        parent: &str,
        category: Category,
        display_name: &str,
    ) -> Result<String> {
        self.reload_if_changed()?;
        let allowed = self
            .root
            .find(parent)
            .ok_or_else(|| Error::NodeNotFound(parent.to_string()))?
            .category
            .child_category();
        if allowed != Some(category) {
            return Err(Error::InvalidOperation(format!(
                "cannot add a {} under '{}'",
                category.as_str(),
                parent
            )));
        }

        let locator = self.next_locator(category);
        let child = Node::new(locator.clone(), category, display_name);
        if let Some(children) = self.root.find_mut(parent).and_then(Node::children_mut) {
            children.push(child);
        }
        self.persist_and_track()?;
        info!("Created {} '{}' under {}", category.as_str(), locator, parent);
        Ok(locator)
    }

    fn delete(&mut self, locator: &str) -> Result<()> {
        self.reload_if_changed()?;
        if self.root.id == locator {
            return Err(Error::InvalidOperation(
                "the course root cannot be deleted".to_string(),
            ));
        }
        let parent_id = self
            .root
            .find_parent(locator)
            .map(|parent| parent.id.clone())
            .ok_or_else(|| Error::NodeNotFound(locator.to_string()))?;
        if let Some(children) = self.root.find_mut(&parent_id).and_then(Node::children_mut) {
            children.retain(|child| child.id != locator);
        }
        self.persist_and_track()?;
        info!("Deleted '{}'", locator);
        Ok(())
    }

    fn duplicate(&mut self, locator: &str, parent: &str) -> Result<String> {
        self.reload_if_changed()?;
        let actual_parent = self
            .root
            .find_parent(locator)
            .map(|p| p.id.clone())
            .ok_or_else(|| Error::NodeNotFound(locator.to_string()))?;
        if actual_parent != parent {
            return Err(Error::InvalidOperation(format!(
                "'{}' is not a child of '{}'",
                locator, parent
            )));
        }

        let original = self
            .root
            .find(locator)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound(locator.to_string()))?;
        let mut copy = self.copy_with_new_locators(&original);
        copy.display_name = format!("Duplicate of '{}'", original.display_name);
        let new_locator = copy.id.clone();

        if let Some(children) = self.root.find_mut(parent).and_then(Node::children_mut) {
            let index = children
                .iter()
                .position(|child| child.id == locator)
                .map_or(children.len(), |i| i + 1);
            children.insert(index, copy);
        }
        self.persist_and_track()?;
        info!("Duplicated '{}' as '{}'", locator, new_locator);
        Ok(new_locator)
    }

    fn rename(&mut self, locator: &str, display_name: &str) -> Result<()> {
        self.reload_if_changed()?;
        let node = self
            .root
            .find_mut(locator)
            .ok_or_else(|| Error::NodeNotFound(locator.to_string()))?;
        node.display_name = display_name.to_string();
        self.persist_and_track()?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> CourseStore {
        CourseStore::in_memory(
            Node::new("course", Category::Course, "Demo").with_children(vec![
                Node::new("chapter-1", Category::Chapter, "Week 1").with_children(vec![
                    Node::new("sequential-2", Category::Sequential, "Intro").with_children(vec![
                        Node::new("vertical-3", Category::Vertical, "Welcome"),
                    ]),
                ]),
                Node::new("chapter-4", Category::Chapter, "Week 2"),
            ]),
        )
    }

    #[test]
    fn test_fetch_missing() {
        assert!(matches!(
            store().fetch("nope"),
            Err(Error::NodeNotFound(l)) if l == "nope"
        ));
    }

    #[test]
    fn test_create_child_appends_with_fresh_locator() {
        let mut store = store();
        let locator = store
            .create_child("course", Category::Chapter, "Section")
            .unwrap();
        assert_eq!(locator, "chapter-5");
        let root = store.fetch("course").unwrap();
        assert_eq!(root.children().last().unwrap().id, "chapter-5");
        assert_eq!(root.children().last().unwrap().display_name, "Section");
    }

    #[test]
    fn test_create_child_rejects_wrong_category() {
        let mut store = store();
        assert!(matches!(
            store.create_child("course", Category::Vertical, "Unit"),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        store.delete("sequential-2").unwrap();
        assert!(store.fetch("chapter-1").unwrap().children().is_empty());
        assert!(store.delete("course").is_err());
        assert!(store.delete("sequential-2").is_err());
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let mut store = store();
        let copy = store.duplicate("chapter-1", "course").unwrap();
        let root = store.fetch("course").unwrap();
        let ids: Vec<&str> = root.children().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["chapter-1", copy.as_str(), "chapter-4"]);

        let duplicated = store.fetch(&copy).unwrap();
        assert_eq!(duplicated.display_name, "Duplicate of 'Week 1'");
        // The subtree is copied with new locators
        let copied_sub = &duplicated.children()[0];
        assert_ne!(copied_sub.id, "sequential-2");
        assert_eq!(copied_sub.children().len(), 1);
        assert_eq!(store.root().locators().len(), 8);
    }

    #[test]
    fn test_duplicate_requires_matching_parent() {
        let mut store = store();
        assert!(store.duplicate("chapter-1", "chapter-4").is_err());
    }

    #[test]
    fn test_rename() {
        let mut store = store();
        store.rename("vertical-3", "Hello").unwrap();
        assert_eq!(store.fetch("vertical-3").unwrap().display_name, "Hello");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");

        let mut created = CourseStore::create(&path, "Physics").unwrap();
        let chapter = created
            .create_child("course", Category::Chapter, "Mechanics")
            .unwrap();

        let mut reopened = CourseStore::open(&path).unwrap();
        assert_eq!(reopened.root().display_name, "Physics");
        assert_eq!(reopened.fetch(&chapter).unwrap().display_name, "Mechanics");
        assert!(!path.with_extension(TEMP_SUFFIX).exists());
    }

    #[test]
    fn test_open_rejects_non_course_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chapter.json");
        let chapter = Node::new("c1", Category::Chapter, "Week 1");
        fs::write(&path, serde_json::to_string(&chapter).unwrap()).unwrap();
        assert!(matches!(
            CourseStore::open(&path),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_reloads_after_external_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");
        let mut store = CourseStore::create(&path, "Physics").unwrap();
        store
            .create_child("course", Category::Chapter, "Mechanics")
            .unwrap();
        assert!(!store.reload_if_changed().unwrap());

        let edited = Node::new("course", Category::Course, "Physics").with_children(vec![
            Node::new("chapter-40", Category::Chapter, "Optics"),
        ]);
        fs::write(&path, serde_json::to_string(&edited).unwrap()).unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let root = store.fetch("course").unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].display_name, "Optics");

        // Locators keep clear of ids already in the edited document
        let next = store
            .create_child("course", Category::Chapter, "Waves")
            .unwrap();
        assert_eq!(next, "chapter-41");
    }
}
