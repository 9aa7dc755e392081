//! Collaborators outside the outline itself.
//!
//! This module provides:
//! - The course service trait and its JSON-file implementation
//! - The transport that runs service calls off the UI thread
//! - Navigation to unit editor pages
//! - Watching the course document for out-of-band edits

mod course_store;
mod navigator;
mod service;
mod transport;
mod watcher;

pub use course_store::CourseStore;
#[cfg(test)]
pub use navigator::RecordingNavigator;
pub use navigator::{unit_editor_url, BrowserNavigator, Navigator};
pub use transport::{Completion, Request, RequestId, Response, Transport};
pub use watcher::{CourseEvent, CourseWatcher};
