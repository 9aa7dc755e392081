//! Per-session collaborators handed to views while they act.

use super::node::Category;
use super::view_state::{RevealRequest, ViewState};
use crate::error::{Error, ResultExt};
use crate::ledger::LedgerStore;
use crate::remote::{Navigator, Request, RequestId, Transport};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Id-only link from a view to its parent view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub id: String,
    pub category: Category,
}

/// Where the completion of a request goes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Route {
    Refresh {
        view: String,
        force: bool,
    },
    Add {
        view: String,
        category: Category,
        display_name: String,
    },
    Delete {
        view: String,
        category: Category,
        parent: Option<ParentLink>,
    },
    Duplicate {
        view: String,
        category: Category,
        parent: ParentLink,
    },
    /// Fetch of a fresh duplicate, spliced into `view` after `after`
    InsertDuplicate {
        view: String,
        after: String,
    },
    Rename {
        view: String,
    },
}

impl Route {
    fn describe(&self) -> String {
        match self {
            Route::Refresh { view, .. } => format!("refresh '{}'", view),
            Route::Add { category, .. } => format!("add a new {}", category.xblock_type()),
            Route::Delete { view, .. } => format!("delete '{}'", view),
            Route::Duplicate { view, .. } => format!("duplicate '{}'", view),
            Route::InsertDuplicate { view, .. } => format!("load the duplicate in '{}'", view),
            Route::Rename { view } => format!("rename '{}'", view),
        }
    }
}

/// Everything a view needs to issue requests and record their effects.
///
/// Owned by the tree and lent to views for the duration of one call.
pub struct Session {
    transport: Transport,
    ledger: LedgerStore,
    navigator: Box<dyn Navigator>,
    routes: HashMap<RequestId, Route>,
    /// View states waiting for their owning view's next render
    pending_view_states: HashMap<String, ViewState>,
    reveal: Option<RevealRequest>,
    navigated_to: Option<String>,
    failures: Vec<String>,
}

impl Session {
    pub fn new(transport: Transport, ledger: LedgerStore, navigator: Box<dyn Navigator>) -> Self {
        Self {
            transport,
            ledger,
            navigator,
            routes: HashMap::new(),
            pending_view_states: HashMap::new(),
            reveal: None,
            navigated_to: None,
            failures: Vec::new(),
        }
    }

    pub(crate) fn submit(&mut self, request: Request, route: Route) -> RequestId {
        let id = self.transport.submit(request);
        debug!("Request #{} routed to {:?}", id, route);
        self.routes.insert(id, route);
        id
    }

    pub(crate) fn take_route(&mut self, id: RequestId) -> Option<Route> {
        self.routes.remove(&id)
    }

    pub(crate) fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Requests issued but not yet completed.
    pub fn pending_requests(&self) -> usize {
        self.routes.len()
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Best-effort ledger bookkeeping
    // ─────────────────────────────────────────────────────────────────────────

    /// Record an added or duplicated entry. Failures are logged and dropped.
    pub fn record_child_added(&mut self, category: Category, name: &str, id: &str, parent: &str) {
        self.ledger
            .record_child_added(category, name, id, parent)
            .log_and_discard("Failed to update sync ledger after add");
    }

    /// Record a deleted entry. Failures are logged and dropped.
    pub fn record_delete(&mut self, category: Category, id: &str, parent: &str) {
        self.ledger
            .record_delete(category, id, parent)
            .log_and_discard("Failed to update sync ledger after delete");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // View state
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue `state` for the next render of view `owner`.
    ///
    /// A later state for the same owner replaces the earlier one.
    pub fn set_pending_view_state(&mut self, owner: impl Into<String>, state: ViewState) {
        let owner = owner.into();
        if let Some(replaced) = self.pending_view_states.insert(owner.clone(), state) {
            debug!("View state {:?} for '{}' replaced before it was shown", replaced, owner);
        }
    }

    /// Take the pending view state if it belongs to `owner`.
    pub fn take_view_state_for(&mut self, owner: &str) -> Option<ViewState> {
        self.pending_view_states.remove(owner)
    }

    pub fn request_reveal(&mut self, reveal: RevealRequest) {
        self.reveal = Some(reveal);
    }

    pub fn take_reveal(&mut self) -> Option<RevealRequest> {
        self.reveal.take()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation and failures
    // ─────────────────────────────────────────────────────────────────────────

    /// Leave the outline. Nothing else is processed afterwards.
    pub fn redirect(&mut self, url: String) {
        info!("Leaving the outline for {}", url);
        self.navigator.redirect(&url);
        self.navigated_to = Some(url);
    }

    pub fn navigated_to(&self) -> Option<&str> {
        self.navigated_to.as_deref()
    }

    pub(crate) fn report_failure(&mut self, route: &Route, error: &Error) {
        warn!("Could not {}: {}", route.describe(), error);
        if let Route::Refresh { view, .. } = route {
            // The render it was waiting for will not happen
            self.pending_view_states.remove(view);
        }
        self.failures
            .push(format!("Could not {}: {}", route.describe(), error));
    }

    pub fn take_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.failures)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("ledger", &self.ledger)
            .field("routes", &self.routes.len())
            .field("navigated_to", &self.navigated_to)
            .finish_non_exhaustive()
    }
}
