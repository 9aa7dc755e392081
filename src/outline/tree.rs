//! The outline tree controller.
//!
//! Owns the root view, the session's expansion set and the collaborators,
//! and routes every completed request back to the view that issued it.

use super::element::AddChildButton;
use super::expansion::ExpansionSet;
use super::node::{Category, Node};
use super::session::{Route, Session};
use super::view::{OutlineNodeView, VisibleRow};
use super::view_state::{RevealRequest, ViewState};
use crate::ledger::{LedgerStore, ProgressIndicator};
use crate::remote::{unit_editor_url, Completion, Navigator, Response, Transport};
use log::{debug, info, warn};

/// Something the user asked the outline to do.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineAction {
    Toggle(String),
    Add(AddChildButton),
    Delete(String),
    Duplicate(String),
    Rename { locator: String, display_name: String },
    Refresh,
}

/// A mounted outline.
#[derive(Debug)]
pub struct OutlineTree {
    root: OutlineNodeView,
    session: Session,
}

impl OutlineTree {
    /// Render `root` and apply the initial view state.
    ///
    /// Without a seed every collapsible node starts expanded.
    pub fn mount(
        root: Node,
        seed: Option<ExpansionSet>,
        view_state: Option<ViewState>,
        transport: Transport,
        ledger: LedgerStore,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let expansion = seed
            .unwrap_or_else(|| ExpansionSet::expand_all(&root))
            .into_shared();
        let mut view = OutlineNodeView::new(root, None, expansion);
        view.render();

        let mut tree = Self {
            root: view,
            session: Session::new(transport, ledger, navigator),
        };
        if let Some(state) = view_state {
            tree.root.set_view_state(&state, &mut tree.session);
        }
        tree.submit_requested_refreshes();
        info!(
            "Outline mounted for '{}' ({} rows visible)",
            tree.root.node().display_name,
            tree.root.visible_rows().len()
        );
        tree
    }

    pub fn root(&self) -> &OutlineNodeView {
        &self.root
    }

    /// Re-fetch the whole outline after an out-of-band edit.
    pub fn refresh(&mut self) {
        self.root.refresh(&mut self.session);
    }

    /// Re-fetch and re-render the outline, then apply `state` once.
    pub fn refresh_with_view_state(&mut self, state: ViewState) {
        self.session
            .set_pending_view_state(self.root.locator().to_string(), state);
        self.root.refresh_forced(&mut self.session);
    }

    /// Flip a node between collapsed and expanded. Never fetches.
    pub fn toggle(&mut self, locator: &str) -> bool {
        self.root
            .find_view_mut(locator)
            .is_some_and(OutlineNodeView::toggle_expand_collapse)
    }

    /// Dispatch a user action to the view it targets.
    pub fn perform(&mut self, action: OutlineAction) {
        if self.session.navigated_to().is_some() {
            debug!("Ignoring {:?} after leaving the outline", action);
            return;
        }
        let session = &mut self.session;
        match action {
            OutlineAction::Toggle(locator) => {
                self.toggle(&locator);
            }
            OutlineAction::Refresh => self.root.refresh(session),
            OutlineAction::Add(button) => match self.root.find_view(&button.parent) {
                Some(view) => view.handle_add_event(&button, session),
                None => warn!("No view for '{}' to add into", button.parent),
            },
            OutlineAction::Delete(locator) => match self.root.find_view(&locator) {
                Some(view) => view.handle_delete_event(session),
                None => warn!("No view for '{}' to delete", locator),
            },
            OutlineAction::Duplicate(locator) => match self.root.find_view(&locator) {
                Some(view) => view.handle_duplicate_event(session),
                None => warn!("No view for '{}' to duplicate", locator),
            },
            OutlineAction::Rename {
                locator,
                display_name,
            } => match self.root.find_view(&locator) {
                Some(view) => view.handle_rename_event(&display_name, session),
                None => warn!("No view for '{}' to rename", locator),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Completion routing
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply every completion that has arrived. Returns how many were handled.
    pub fn poll(&mut self) -> usize {
        let completions = self.session.transport_mut().poll();
        let count = completions.len();
        for completion in completions {
            self.dispatch(completion);
        }
        self.submit_requested_refreshes();
        count
    }

    fn dispatch(&mut self, completion: Completion) {
        let Some(route) = self.session.take_route(completion.id) else {
            warn!("Completion #{} has no route", completion.id);
            return;
        };
        if let Some(url) = self.session.navigated_to() {
            debug!("Dropping completion #{} after redirect to {}", completion.id, url);
            return;
        }
        match completion.result {
            Ok(response) => self.complete(route, response),
            Err(e) => self.session.report_failure(&route, &e),
        }
    }

    fn complete(&mut self, route: Route, response: Response) {
        let session = &mut self.session;
        match (route, response) {
            (Route::Refresh { view, force }, Response::Fetched(node)) => {
                match self.root.find_view_mut(&view) {
                    Some(target) => {
                        target.on_sync(node.clone(), force, session);
                        self.root.sync_model(&node);
                    }
                    None => debug!("View '{}' is gone, refresh dropped", view),
                }
            }
            (
                Route::Add {
                    view,
                    category,
                    display_name,
                },
                Response::Created(locator),
            ) => {
                session.record_child_added(category, &display_name, &locator, &view);
                match self.root.find_view_mut(&view) {
                    Some(target) => target.on_child_added(&locator, category, session),
                    None if category == Category::Vertical => {
                        session.redirect(unit_editor_url(&locator))
                    }
                    None => debug!("View '{}' is gone, added '{}' not shown", view, locator),
                }
            }
            (
                Route::Delete {
                    view,
                    category,
                    parent,
                },
                Response::Deleted,
            ) => {
                let parent_id = parent.as_ref().map_or("", |link| link.id.as_str());
                session.record_delete(category, &view, parent_id);
                if let Some(link) = parent {
                    if let Some(target) = self.root.find_view_mut(&link.id) {
                        target.on_child_deleted(session);
                    }
                }
            }
            (
                Route::Duplicate {
                    view,
                    category,
                    parent,
                },
                Response::Duplicated(locator),
            ) => {
                session.record_child_added(category, "", &locator, &parent.id);
                match self.root.find_view_mut(&parent.id) {
                    Some(target) => target.on_child_duplicated(&locator, &view, session),
                    None => debug!("View '{}' is gone, duplicate not shown", parent.id),
                }
            }
            (Route::InsertDuplicate { view, after }, Response::Fetched(node)) => {
                if let Some(target) = self.root.find_view_mut(&view) {
                    target.insert_child_after(&after, node);
                    let updated = target.node().clone();
                    self.root.sync_model(&updated);
                }
            }
            (Route::Rename { view }, Response::Renamed) => {
                if let Some(target) = self.root.find_view(&view) {
                    target.refresh(session);
                }
            }
            (route, response) => {
                warn!("Unexpected response {:?} for {:?}", response, route);
            }
        }
    }

    fn submit_requested_refreshes(&mut self) {
        let mut locators = Vec::new();
        self.root.take_refresh_requests(&mut locators);
        for locator in locators {
            if let Some(view) = self.root.find_view(&locator) {
                view.refresh(&mut self.session);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Surface accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        self.root.visible_rows()
    }

    /// The reveal produced by the last view state, once.
    pub fn take_reveal(&mut self) -> Option<RevealRequest> {
        self.session.take_reveal()
    }

    pub fn take_failures(&mut self) -> Vec<String> {
        self.session.take_failures()
    }

    pub fn progress(&self) -> &ProgressIndicator {
        self.session.ledger().progress()
    }

    #[cfg(test)]
    pub fn ledger(&self) -> &LedgerStore {
        self.session.ledger()
    }

    pub fn navigated_to(&self) -> Option<&str> {
        self.session.navigated_to()
    }

    /// Whether any request is still waiting for its completion.
    pub fn has_pending(&self) -> bool {
        self.session.pending_requests() > 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DeltaLedger, MemoryStorage, SectionEntry};
    use crate::remote::{CourseStore, RecordingNavigator};

    fn course() -> Node {
        Node::new("course", Category::Course, "Demo").with_children(vec![
            Node::new("c1", Category::Chapter, "Week 1").with_children(vec![
                Node::new("s1", Category::Sequential, "Intro")
                    .with_children(vec![Node::new("u9", Category::Vertical, "Welcome")]),
            ]),
            Node::new("c2", Category::Chapter, "Week 2"),
        ])
    }

    fn mount(served: Node, shown: Node) -> (OutlineTree, RecordingNavigator) {
        let navigator = RecordingNavigator::default();
        let tree = OutlineTree::mount(
            shown,
            None,
            None,
            Transport::inline(Box::new(CourseStore::in_memory(served))),
            LedgerStore::open(Box::new(MemoryStorage::new())),
            Box::new(navigator.clone()),
        );
        (tree, navigator)
    }

    /// Poll until every issued request has completed.
    fn settle(tree: &mut OutlineTree) {
        for _ in 0..10 {
            if !tree.has_pending() {
                return;
            }
            tree.poll();
        }
        panic!("outline did not settle");
    }

    fn child_ids(tree: &OutlineTree) -> Vec<String> {
        tree.root()
            .children()
            .iter()
            .map(|view| view.locator().to_string())
            .collect()
    }

    #[test]
    fn test_mount_expands_all_by_default() {
        let (tree, _) = mount(course(), course());
        let rows: Vec<&str> = tree
            .visible_rows()
            .iter()
            .map(|row| row.element.locator.as_str())
            .collect();
        assert_eq!(rows, vec!["course", "c1", "s1", "u9", "c2"]);
        assert!(!tree.has_pending());
    }

    #[test]
    fn test_mount_applies_initial_view_state() {
        let navigator = RecordingNavigator::default();
        let mut tree = OutlineTree::mount(
            course(),
            Some(ExpansionSet::new()),
            Some(ViewState::show("c2").with_scroll_offset(12)),
            Transport::inline(Box::new(CourseStore::in_memory(course()))),
            LedgerStore::open(Box::new(MemoryStorage::new())),
            Box::new(navigator),
        );
        assert_eq!(
            tree.take_reveal(),
            Some(RevealRequest {
                locator: "c2".to_string(),
                scroll_offset: 12,
                open_rename: false,
            })
        );
        assert_eq!(tree.visible_rows().len(), 3);
    }

    #[test]
    fn test_double_toggle_does_not_fetch() {
        let (mut tree, _) = mount(course(), course());
        assert!(tree.toggle("c1"));
        assert!(tree.root().find_view("c1").unwrap().element().unwrap().is_collapsed);
        assert!(tree.toggle("c1"));
        assert!(!tree.root().find_view("c1").unwrap().element().unwrap().is_collapsed);
        assert!(!tree.has_pending());
        assert_eq!(tree.poll(), 0);
    }

    #[test]
    fn test_add_and_delete_section_updates_ledger() {
        let empty = Node::new("course", Category::Course, "Demo");
        let (mut tree, _) = mount(empty.clone(), empty);

        tree.perform(OutlineAction::Add(AddChildButton {
            category: Category::Chapter,
            parent: "course".to_string(),
            default_name: "Week 1".to_string(),
            label: "New Section".to_string(),
        }));
        settle(&mut tree);

        assert_eq!(
            tree.ledger().load().unwrap(),
            DeltaLedger {
                delta_count: 1,
                sections: vec![SectionEntry::modified("chapter-1", "Week 1")],
            }
        );
        assert!(!tree.progress().all_caught_up);
        assert_eq!(tree.progress().count_label(), "1");
        assert_eq!(child_ids(&tree), vec!["chapter-1"]);
        assert_eq!(
            tree.take_reveal(),
            Some(RevealRequest {
                locator: "chapter-1".to_string(),
                scroll_offset: 0,
                open_rename: true,
            })
        );

        tree.perform(OutlineAction::Delete("chapter-1".to_string()));
        settle(&mut tree);

        assert_eq!(tree.ledger().load().unwrap(), DeltaLedger::new());
        assert!(tree.progress().all_caught_up);
        assert!(child_ids(&tree).is_empty());
    }

    #[test]
    fn test_view_state_applies_once() {
        let (mut tree, _) = mount(course(), course());
        tree.refresh_with_view_state(ViewState::show("u9").with_scroll_offset(40).with_rename());
        settle(&mut tree);
        assert_eq!(
            tree.take_reveal(),
            Some(RevealRequest {
                locator: "u9".to_string(),
                scroll_offset: 40,
                open_rename: true,
            })
        );

        // A later render that really happens must not show it again
        tree.root.refresh_forced(&mut tree.session);
        settle(&mut tree);
        assert_eq!(tree.take_reveal(), None);

        tree.refresh();
        settle(&mut tree);
        assert_eq!(tree.take_reveal(), None);
    }

    #[test]
    fn test_missing_reveal_target_is_not_fatal() {
        let (mut tree, _) = mount(course(), course());
        tree.refresh_with_view_state(ViewState::show("nowhere"));
        settle(&mut tree);
        assert_eq!(tree.take_reveal(), None);
        assert_eq!(tree.visible_rows().len(), 5);
    }

    #[test]
    fn test_refresh_picks_up_out_of_band_changes() {
        let mut served = course();
        served.find_mut("c2").unwrap().display_name = "Week Two".to_string();
        let (mut tree, _) = mount(served, course());

        tree.refresh();
        settle(&mut tree);
        assert_eq!(
            tree.root().find_view("c2").unwrap().element().unwrap().display_name,
            "Week Two"
        );
    }

    #[test]
    fn test_unit_add_redirects_and_stops() {
        let (mut tree, navigator) = mount(course(), course());
        let button = tree
            .root()
            .find_view("s1")
            .and_then(|view| view.element())
            .and_then(|element| element.add_button())
            .cloned()
            .unwrap();
        tree.perform(OutlineAction::Add(button));
        tree.perform(OutlineAction::Delete("c2".to_string()));
        settle(&mut tree);

        let url = tree.navigated_to().unwrap().to_string();
        assert!(url.starts_with("/container/vertical-"));
        assert!(url.ends_with("?action=new"));
        assert_eq!(*navigator.visited.borrow(), vec![url]);
        // The delete completed after the redirect and was ignored
        assert_eq!(child_ids(&tree), vec!["c1", "c2"]);
        assert_eq!(tree.ledger().load().unwrap(), DeltaLedger::new());

        tree.perform(OutlineAction::Refresh);
        assert!(!tree.has_pending());
    }

    #[test]
    fn test_duplicate_is_spliced_after_original() {
        let (mut tree, _) = mount(course(), course());
        tree.perform(OutlineAction::Duplicate("c1".to_string()));
        settle(&mut tree);

        let ids = child_ids(&tree);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "c1");
        assert_eq!(ids[2], "c2");
        let copy = tree.root().find_view(&ids[1]).unwrap();
        assert_eq!(copy.node().display_name, "Duplicate of 'Week 1'");

        let ledger = tree.ledger().load().unwrap();
        assert_eq!(ledger.delta_count, 1);
        assert_eq!(ledger.sections, vec![SectionEntry::modified(ids[1].clone(), "")]);
        let model: Vec<&str> = tree
            .root()
            .node()
            .children()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(model, ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_failed_delete_changes_nothing() {
        let mut shown = course();
        shown
            .children_mut()
            .unwrap()
            .push(Node::new("ghost", Category::Chapter, "Ghost"));
        let (mut tree, _) = mount(course(), shown);

        tree.perform(OutlineAction::Delete("ghost".to_string()));
        settle(&mut tree);

        let failures = tree.take_failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("ghost"));
        assert_eq!(tree.ledger().load().unwrap(), DeltaLedger::new());
        assert!(tree.root().find_view("ghost").is_some());
    }

    #[test]
    fn test_rename_refreshes_view() {
        let (mut tree, _) = mount(course(), course());
        tree.perform(OutlineAction::Rename {
            locator: "s1".to_string(),
            display_name: "  Getting started ".to_string(),
        });
        settle(&mut tree);
        assert_eq!(
            tree.root().find_view("s1").unwrap().element().unwrap().display_name,
            "Getting started"
        );
        assert_eq!(
            tree.root().node().find("s1").unwrap().display_name,
            "Getting started"
        );
    }
}
