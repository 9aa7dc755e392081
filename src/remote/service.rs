//! The course service the outline talks to.

use crate::error::Result;
use crate::outline::{Category, Node};

/// Request/response operations on the authoritative course data.
///
/// Implementations run on the transport worker thread, never on the UI
/// thread.
pub trait OutlineService: Send {
    /// Current representation of a node and its subtree.
    ///
    /// Takes `&mut self` so implementations may pick up changes made to
    /// their backing data by someone else.
    fn fetch(&mut self, locator: &str) -> Result<Node>;

    /// Create a child under `parent`; returns the new locator.
    fn create_child(&mut self, parent: &str, category: Category, display_name: &str)
        -> Result<String>;

    fn delete(&mut self, locator: &str) -> Result<()>;

    /// Copy `locator` (with its subtree) directly after itself inside
    /// `parent`; returns the locator of the copy.
    fn duplicate(&mut self, locator: &str, parent: &str) -> Result<String>;

    fn rename(&mut self, locator: &str, display_name: &str) -> Result<()>;
}
