//! Recursive course outline.
//!
//! This module provides:
//! - The node data model
//! - The shared expansion set and one-shot view state
//! - Recursive node views and their rendered elements
//! - The tree controller that mounts views and routes completions

mod element;
mod expansion;
mod node;
mod session;
mod tree;
mod view;
mod view_state;

pub use element::{Control, RenderedElement};
pub use expansion::ExpansionSet;
pub use node::{Category, Node, VisibilityState};
pub use tree::{OutlineAction, OutlineTree};
pub use view::VisibleRow;
pub use view_state::{RevealRequest, ViewState};
