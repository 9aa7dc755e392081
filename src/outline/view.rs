//! The recursive outline view.
//!
//! Each [`OutlineNodeView`] renders one node and owns the views of its
//! children once they are materialized. Views reach the rest of the session
//! (transport, ledger, navigation) only through the [`Session`] lent to them
//! by the tree, and reach their parent only by locator.

use super::element::{AddChildButton, RenderedElement};
use super::expansion::SharedExpansion;
use super::node::{Category, Node};
use super::session::{ParentLink, Route, Session};
use super::view_state::{RevealRequest, ViewState};
use crate::remote::{unit_editor_url, Request};
use log::{debug, error, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Child Policy
// ─────────────────────────────────────────────────────────────────────────────

/// How a category treats its children in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Children are always shown (the course root)
    AlwaysExpanded,
    /// Children are shown while the node is in the expansion set
    Collapsible,
    /// Children are never shown in the outline
    Hidden,
}

impl ChildPolicy {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Course => ChildPolicy::AlwaysExpanded,
            Category::Chapter | Category::Sequential => ChildPolicy::Collapsible,
            Category::Vertical | Category::Component => ChildPolicy::Hidden,
        }
    }

    pub fn should_render_children(&self) -> bool {
        !matches!(self, ChildPolicy::Hidden)
    }

    pub fn should_expand_children(&self, expanded: bool) -> bool {
        match self {
            ChildPolicy::AlwaysExpanded => true,
            ChildPolicy::Collapsible => expanded,
            ChildPolicy::Hidden => false,
        }
    }
}

/// A rendered row together with its nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    pub depth: usize,
    pub element: &'a RenderedElement,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outline Node View
// ─────────────────────────────────────────────────────────────────────────────

/// View of one outline node and, once materialized, its children.
#[derive(Debug)]
pub struct OutlineNodeView {
    node: Node,
    parent: Option<ParentLink>,
    expansion: SharedExpansion,
    policy: ChildPolicy,
    element: Option<RenderedElement>,
    children: Vec<OutlineNodeView>,
    rendered_children: bool,
    refresh_requested: bool,
}

impl OutlineNodeView {
    pub fn new(node: Node, parent: Option<ParentLink>, expansion: SharedExpansion) -> Self {
        let policy = ChildPolicy::for_category(node.category);
        Self {
            node,
            parent,
            expansion,
            policy,
            element: None,
            children: Vec::new(),
            rendered_children: false,
            refresh_requested: false,
        }
    }

    pub fn locator(&self) -> &str {
        &self.node.id
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// The element from the last render, if rendered.
    pub fn element(&self) -> Option<&RenderedElement> {
        self.element.as_ref()
    }

    /// Materialized child views in document order.
    pub fn children(&self) -> &[OutlineNodeView] {
        &self.children
    }

    #[cfg(test)]
    pub fn has_rendered_children(&self) -> bool {
        self.rendered_children
    }

    pub fn should_render_children(&self) -> bool {
        self.policy.should_render_children()
    }

    pub fn should_expand_children(&self) -> bool {
        let expanded = self.expansion.borrow().contains(&self.node.id);
        self.policy.should_expand_children(expanded)
    }

    fn is_header_suppressed(&self) -> bool {
        self.node.is_header_visible == Some(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Render this node and, when expanded, rebuild its child views.
    pub fn render(&mut self) {
        // Header-suppressed nodes pin themselves open for the session
        if self.is_header_suppressed() && self.expansion.borrow_mut().add(self.node.id.clone()) {
            self.refresh_requested = true;
        }

        let should_render = self.should_render_children();
        let should_expand = self.should_expand_children();
        self.element = Some(RenderedElement::build(
            &self.node,
            self.parent.as_ref().map(|parent| parent.category),
            should_render,
            should_render && !should_expand,
        ));

        self.children.clear();
        self.rendered_children = false;
        if should_render && should_expand {
            self.render_children();
        }
    }

    fn render_children(&mut self) {
        let link = ParentLink {
            id: self.node.id.clone(),
            category: self.node.category,
        };
        self.children = self
            .node
            .children()
            .iter()
            .map(|child| {
                let mut view =
                    OutlineNodeView::new(child.clone(), Some(link.clone()), self.expansion.clone());
                view.render();
                view
            })
            .collect();
        self.rendered_children = true;
    }

    /// Materialize the child views if that has not happened yet.
    pub fn ensure_children_rendered(&mut self) {
        if !self.rendered_children && self.should_render_children() {
            self.render_children();
        }
    }

    /// Flip this node between collapsed and expanded.
    ///
    /// Children are built on first expansion and kept when collapsing.
    /// Returns `false` when the node cannot be collapsed.
    pub fn toggle_expand_collapse(&mut self) -> bool {
        if self.policy != ChildPolicy::Collapsible || self.is_header_suppressed() {
            return false;
        }
        let expanded = {
            let mut expansion = self.expansion.borrow_mut();
            if expansion.remove(&self.node.id) {
                false
            } else {
                expansion.add(self.node.id.clone());
                true
            }
        };
        if expanded {
            self.ensure_children_rendered();
        }
        if let Some(element) = self.element.as_mut() {
            element.is_collapsed = !expanded;
        }
        true
    }

    /// Rows currently visible in this subtree, in display order.
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        let mut rows = Vec::new();
        self.collect_rows(0, &mut rows);
        rows
    }

    fn collect_rows<'a>(&'a self, depth: usize, rows: &mut Vec<VisibleRow<'a>>) {
        let Some(element) = &self.element else {
            return;
        };
        let child_depth = if element.header_visible {
            rows.push(VisibleRow { depth, element });
            depth + 1
        } else {
            depth
        };
        if self.rendered_children && self.should_expand_children() {
            for child in &self.children {
                child.collect_rows(child_depth, rows);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-fetch this node. The view re-renders when the data changed.
    pub fn refresh(&self, session: &mut Session) {
        self.submit_refresh(session, false);
    }

    /// Re-fetch this node and re-render even if nothing changed.
    pub fn refresh_forced(&self, session: &mut Session) {
        self.submit_refresh(session, true);
    }

    fn submit_refresh(&self, session: &mut Session, force: bool) {
        session.submit(
            Request::Fetch {
                locator: self.node.id.clone(),
            },
            Route::Refresh {
                view: self.node.id.clone(),
                force,
            },
        );
    }

    /// Apply fetched data. Returns whether the view re-rendered.
    pub fn on_sync(&mut self, fetched: Node, force: bool, session: &mut Session) -> bool {
        let changed = self.node.has_changed_attributes(&fetched);
        self.node = fetched;
        if changed || force {
            self.on_node_change(session);
            true
        } else {
            debug!("'{}' unchanged after refresh", self.node.id);
            false
        }
    }

    fn on_node_change(&mut self, session: &mut Session) {
        self.render();
        if let Some(state) = session.take_view_state_for(&self.node.id) {
            self.set_view_state(&state, session);
        }
    }

    /// Resolve a view state against this subtree and request the reveal.
    pub fn set_view_state(&self, state: &ViewState, session: &mut Session) {
        let Some(locator) = &state.locator_to_show else {
            return;
        };
        let found = self.node.id == *locator
            || self
                .find_view(locator)
                .is_some_and(|view| view.element.is_some());
        if found {
            session.request_reveal(RevealRequest {
                locator: locator.clone(),
                scroll_offset: state.scroll_offset,
                open_rename: state.edit_display_name,
            });
        } else {
            error!("Failed to show item with locator {}", locator);
        }
    }

    /// Copy `node` into this subtree's data wherever its locator appears.
    pub fn sync_model(&mut self, node: &Node) {
        if self.node.id == node.id {
            self.node = node.clone();
            return;
        }
        if let Some(stale) = self.node.find_mut(&node.id) {
            *stale = node.clone();
        }
        for child in &mut self.children {
            child.sync_model(node);
        }
    }

    /// Locators of views that asked for a refresh while rendering.
    pub fn take_refresh_requests(&mut self, locators: &mut Vec<String>) {
        if std::mem::take(&mut self.refresh_requested) {
            locators.push(self.node.id.clone());
        }
        for child in &mut self.children {
            child.take_refresh_requests(locators);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Add
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a child as described by `button`.
    pub fn handle_add_event(&self, button: &AddChildButton, session: &mut Session) {
        session.submit(
            Request::CreateChild {
                parent: button.parent.clone(),
                category: button.category,
                display_name: button.default_name.clone(),
            },
            Route::Add {
                view: self.node.id.clone(),
                category: button.category,
                display_name: button.default_name.clone(),
            },
        );
    }

    /// A child was created under this node.
    pub fn on_child_added(&mut self, locator: &str, category: Category, session: &mut Session) {
        if category == Category::Vertical {
            self.on_unit_added(locator, session);
        } else {
            session.set_pending_view_state(
                self.node.id.clone(),
                ViewState::show(locator).with_rename(),
            );
            self.refresh(session);
        }
    }

    /// New units are edited on their own page.
    pub fn on_unit_added(&mut self, locator: &str, session: &mut Session) {
        session.redirect(unit_editor_url(locator));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delete
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete this node.
    pub fn handle_delete_event(&self, session: &mut Session) {
        session.submit(
            Request::Delete {
                locator: self.node.id.clone(),
            },
            Route::Delete {
                view: self.node.id.clone(),
                category: self.node.category,
                parent: self.parent.clone(),
            },
        );
    }

    pub fn on_child_deleted(&mut self, session: &mut Session) {
        self.refresh(session);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Duplicate
    // ─────────────────────────────────────────────────────────────────────────

    /// Duplicate this node next to itself.
    pub fn handle_duplicate_event(&self, session: &mut Session) {
        let Some(parent) = &self.parent else {
            warn!("'{}' has no parent to duplicate into", self.node.id);
            return;
        };
        session.submit(
            Request::Duplicate {
                locator: self.node.id.clone(),
                parent: parent.id.clone(),
            },
            Route::Duplicate {
                view: self.node.id.clone(),
                category: self.node.category,
                parent: parent.clone(),
            },
        );
    }

    /// The child `original` was duplicated as `locator`; load it for splicing.
    pub fn on_child_duplicated(&mut self, locator: &str, original: &str, session: &mut Session) {
        session.submit(
            Request::Fetch {
                locator: locator.to_string(),
            },
            Route::InsertDuplicate {
                view: self.node.id.clone(),
                after: original.to_string(),
            },
        );
    }

    /// Splice `node` in directly after the child `after`.
    pub fn insert_child_after(&mut self, after: &str, node: Node) {
        let link = ParentLink {
            id: self.node.id.clone(),
            category: self.node.category,
        };
        if let Some(children) = self.node.children_mut() {
            let index = children
                .iter()
                .position(|child| child.id == after)
                .map_or(children.len(), |i| i + 1);
            children.insert(index, node.clone());
        }
        if self.rendered_children {
            let mut view = OutlineNodeView::new(node, Some(link), self.expansion.clone());
            view.render();
            let index = self
                .children
                .iter()
                .position(|child| child.node.id == after)
                .map_or(self.children.len(), |i| i + 1);
            self.children.insert(index, view);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rename
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit a new display name from the inline editor.
    pub fn handle_rename_event(&self, display_name: &str, session: &mut Session) {
        let display_name = display_name.trim();
        if display_name.is_empty() || display_name == self.node.display_name {
            return;
        }
        session.submit(
            Request::Rename {
                locator: self.node.id.clone(),
                display_name: display_name.to_string(),
            },
            Route::Rename {
                view: self.node.id.clone(),
            },
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// Find a materialized view by locator in this subtree.
    pub fn find_view(&self, locator: &str) -> Option<&OutlineNodeView> {
        if self.node.id == locator {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_view(locator))
    }

    pub fn find_view_mut(&mut self, locator: &str) -> Option<&mut OutlineNodeView> {
        if self.node.id == locator {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_view_mut(locator))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
