//! Native file dialog integration using the rfd crate
//!
//! Pickers for opening an existing course document or choosing where a new
//! one is created.

use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// Extensions of course documents.
const COURSE_EXTENSIONS: &[&str] = &["json"];

/// Opens a native file dialog for selecting a course document.
///
/// Returns `Some(PathBuf)` if a file was selected, `None` if cancelled.
pub fn open_course_dialog(initial_dir: Option<&Path>) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("Open Course")
        .add_filter("Course Files", COURSE_EXTENSIONS)
        .add_filter("All Files", &["*"]);

    if let Some(dir) = initial_dir {
        dialog = dialog.set_directory(dir);
    }

    dialog.pick_file()
}

/// Opens a native save dialog for creating a new course document.
///
/// Returns `Some(PathBuf)` if a location was selected, `None` if cancelled.
pub fn new_course_dialog(initial_dir: Option<&Path>) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("New Course")
        .add_filter("Course Files", COURSE_EXTENSIONS)
        .set_file_name("course.json");

    if let Some(dir) = initial_dir {
        dialog = dialog.set_directory(dir);
    }

    dialog.save_file()
}
