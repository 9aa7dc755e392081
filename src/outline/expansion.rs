//! Expanded-node bookkeeping shared by every view of one outline session.

use super::node::Node;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Handle to the session's expansion set, cloned into each view.
pub type SharedExpansion = Rc<RefCell<ExpansionSet>>;

/// Set of locators currently shown expanded.
///
/// Membership only matters for collapsible categories; views of other
/// categories never consult it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    locators: HashSet<String>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an explicit list of locators.
    #[cfg(test)]
    pub fn from_locators<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locators: locators.into_iter().map(Into::into).collect(),
        }
    }

    /// Default-expand-all policy: every collapsible node of `root`.
    pub fn expand_all(root: &Node) -> Self {
        let mut set = Self::new();
        set.add_collapsible(root);
        set
    }

    fn add_collapsible(&mut self, node: &Node) {
        if node.category.is_collapsible() {
            self.locators.insert(node.id.clone());
        }
        for child in node.children() {
            self.add_collapsible(child);
        }
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.locators.contains(locator)
    }

    /// Returns `true` if the locator was not already present.
    pub fn add(&mut self, locator: impl Into<String>) -> bool {
        self.locators.insert(locator.into())
    }

    /// Returns `true` if the locator was present.
    pub fn remove(&mut self, locator: &str) -> bool {
        self.locators.remove(locator)
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Wrap into the shared handle views are constructed with.
    pub fn into_shared(self) -> SharedExpansion {
        Rc::new(RefCell::new(self))
    }
}
