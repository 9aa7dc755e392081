//! Application state management for the outliner
//!
//! This module holds the runtime state that outlives a single frame: the
//! settings, the open course with its outline tree and file watcher, and
//! the flags for windows, error modals and toasts.

use crate::config::{save_config_silent, Settings};
use crate::error::{Error, Result};
use crate::ledger::{FileStorage, LedgerStore, MemoryStorage};
use crate::outline::{ExpansionSet, OutlineTree};
use crate::remote::{BrowserNavigator, CourseEvent, CourseStore, CourseWatcher, Transport};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Display name given to courses created from the app.
pub const NEW_COURSE_NAME: &str = "New Course";

/// How long toasts stay on screen, in seconds.
pub const TOAST_DURATION: f64 = 3.0;

// ─────────────────────────────────────────────────────────────────────────────
// Open Course
// ─────────────────────────────────────────────────────────────────────────────

/// A course document mounted as an outline.
#[derive(Debug)]
pub struct OpenCourse {
    pub path: PathBuf,
    pub tree: OutlineTree,
    watcher: Option<CourseWatcher>,
}

impl OpenCourse {
    /// Mount the course document at `path`.
    pub fn open(path: &Path, settings: &Settings, ledger: LedgerStore) -> Result<Self> {
        let store = CourseStore::open(path)?;
        Self::mount(path, store, settings, ledger)
    }

    /// Create a new course document at `path` and mount it.
    pub fn create(path: &Path, settings: &Settings, ledger: LedgerStore) -> Result<Self> {
        let store = CourseStore::create(path, NEW_COURSE_NAME)?;
        Self::mount(path, store, settings, ledger)
    }

    fn mount(
        path: &Path,
        store: CourseStore,
        settings: &Settings,
        ledger: LedgerStore,
    ) -> Result<Self> {
        let root = store.root().clone();
        let transport = Transport::spawn(Box::new(store))?;
        let navigator = BrowserNavigator::new(settings.studio_base_url.clone());
        let seed = (!settings.expand_all_on_load).then(ExpansionSet::new);
        let tree = OutlineTree::mount(root, seed, None, transport, ledger, Box::new(navigator));

        let watcher = match CourseWatcher::new(path.to_path_buf()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Course changes on disk will not be picked up: {}", e);
                None
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            tree,
            watcher,
        })
    }

    /// Window title fragment for this course.
    pub fn title(&self) -> String {
        let name = &self.tree.root().node().display_name;
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{} ({})", name, file)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn take_watcher_events(&mut self) -> Vec<CourseEvent> {
        self.watcher
            .as_ref()
            .map(CourseWatcher::poll_events)
            .unwrap_or_default()
    }
}

/// The ledger in the per-user config directory, or an in-memory one.
pub fn default_ledger() -> LedgerStore {
    match FileStorage::in_config_dir() {
        Ok(storage) => LedgerStore::open(Box::new(storage)),
        Err(e) => {
            warn!("Sync ledger will not persist: {}", e);
            LedgerStore::open(Box::new(MemoryStorage::new()))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

/// UI-related state flags.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Whether the settings window is open
    pub show_settings: bool,
    /// Whether to show error modal
    pub show_error_modal: bool,
    /// Error message for modal
    pub error_message: String,
    /// Temporary toast message
    pub toast_message: Option<String>,
    /// When the toast message should expire (as seconds since app start)
    pub toast_expires_at: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state struct.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub ui: UiState,
    pub course: Option<OpenCourse>,
    /// Whether settings have been modified and need saving
    settings_dirty: bool,
}

impl AppState {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ui: UiState::default(),
            course: None,
            settings_dirty: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Course Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the course document at `path`, replacing the current one.
    pub fn open_course(&mut self, path: PathBuf) -> Result<()> {
        let course = OpenCourse::open(&path, &self.settings, default_ledger())?;
        self.install_course(course, path);
        Ok(())
    }

    /// Create a course document at `path` and open it.
    pub fn create_course(&mut self, path: PathBuf) -> Result<()> {
        let course = OpenCourse::create(&path, &self.settings, default_ledger())?;
        self.install_course(course, path);
        Ok(())
    }

    /// Mount the current course again, e.g. after leaving it for a unit editor.
    pub fn reopen_course(&mut self) -> Result<()> {
        let path = self
            .course
            .as_ref()
            .map(|course| course.path.clone())
            .ok_or_else(|| Error::Application("No course is open".to_string()))?;
        self.open_course(path)
    }

    fn install_course(&mut self, course: OpenCourse, path: PathBuf) {
        info!("Course mounted: {}", course.title());
        self.course = Some(course);
        self.settings.add_recent_course(path);
        self.settings_dirty = true;
    }

    /// Drive the open course for one frame: apply completions and react
    /// to changes on disk. Returns `true` if anything happened.
    pub fn poll_course(&mut self, current_time: f64) -> bool {
        let Some(course) = self.course.as_mut() else {
            return false;
        };

        let mut activity = course.tree.poll() > 0;
        let failures = course.tree.take_failures();

        let mut changed_on_disk = false;
        let mut removed = None;
        for event in course.take_watcher_events() {
            match event {
                CourseEvent::Changed(_) => changed_on_disk = true,
                CourseEvent::Removed(path) => removed = Some(path),
                CourseEvent::Error(e) => warn!("Course watcher error: {}", e),
            }
        }

        if changed_on_disk && course.tree.navigated_to().is_none() {
            debug!("Course document changed on disk, refreshing outline");
            course.tree.refresh();
            activity = true;
        }

        if !failures.is_empty() {
            self.show_toast(failures.join("\n"), current_time, TOAST_DURATION * 2.0);
            activity = true;
        }
        if let Some(path) = removed {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            self.show_toast(format!("{} was removed", name), current_time, TOAST_DURATION);
            activity = true;
        }

        activity
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark settings as dirty (needing to be saved).
    pub fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Save settings to config file if modified.
    ///
    /// Returns `true` if settings were saved.
    pub fn save_settings_if_dirty(&mut self) -> bool {
        if self.settings_dirty {
            if save_config_silent(&self.settings) {
                self.settings_dirty = false;
                info!("Settings saved");
                return true;
            }
            warn!("Failed to save settings");
        }
        false
    }

    /// Prepare state for application shutdown.
    pub fn shutdown(&mut self) {
        if let Some(course) = &self.course {
            self.settings.course_file = Some(course.path.clone());
        }
        self.settings_dirty = true;
        self.save_settings_if_dirty();
        info!("AppState shutdown complete");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UI State Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_settings(&mut self) {
        self.ui.show_settings = !self.ui.show_settings;
    }

    /// Show an error in a modal dialog.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.ui.error_message = message.into();
        self.ui.show_error_modal = true;
    }

    pub fn dismiss_error(&mut self) {
        self.ui.show_error_modal = false;
        self.ui.error_message.clear();
    }

    /// Show a temporary toast message.
    ///
    /// `current_time` is the app time in seconds, `duration` how long to
    /// show the message.
    pub fn show_toast(&mut self, message: impl Into<String>, current_time: f64, duration: f64) {
        self.ui.toast_message = Some(message.into());
        self.ui.toast_expires_at = Some(current_time + duration);
    }

    /// Clear the toast once it has expired. Call this each frame.
    pub fn update_toast(&mut self, current_time: f64) {
        if let Some(expires_at) = self.ui.toast_expires_at {
            if current_time >= expires_at {
                self.ui.toast_message = None;
                self.ui.toast_expires_at = None;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Category, OutlineAction};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn memory_ledger() -> LedgerStore {
        LedgerStore::open(Box::new(MemoryStorage::new()))
    }

    /// Poll until no request is pending.
    fn settle(course: &mut OpenCourse) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while course.tree.has_pending() && Instant::now() < deadline {
            course.tree.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        course.tree.poll();
    }

    #[test]
    fn test_toast_expires() {
        let mut state = AppState::with_settings(Settings::default());
        state.show_toast("Saved", 10.0, 2.0);
        state.update_toast(11.0);
        assert_eq!(state.ui.toast_message.as_deref(), Some("Saved"));
        state.update_toast(12.0);
        assert!(state.ui.toast_message.is_none());
        assert!(state.ui.toast_expires_at.is_none());
    }

    #[test]
    fn test_error_modal() {
        let mut state = AppState::with_settings(Settings::default());
        state.show_error("Could not delete 'Week 1'");
        assert!(state.ui.show_error_modal);
        state.dismiss_error();
        assert!(!state.ui.show_error_modal);
        assert!(state.ui.error_message.is_empty());
    }

    #[test]
    fn test_reopen_without_course_fails() {
        let mut state = AppState::with_settings(Settings::default());
        assert!(matches!(state.reopen_course(), Err(Error::Application(_))));
        assert!(!state.poll_course(0.0));
    }

    #[test]
    fn test_create_mounts_course() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("physics.json");
        let course = OpenCourse::create(&path, &Settings::default(), memory_ledger()).unwrap();

        assert!(path.exists());
        assert_eq!(course.tree.root().node().display_name, NEW_COURSE_NAME);
        assert_eq!(course.title(), "New Course (physics.json)");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = OpenCourse::open(
            &dir.path().join("missing.json"),
            &Settings::default(),
            memory_ledger(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_add_section_through_worker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");
        let mut course = OpenCourse::create(&path, &Settings::default(), memory_ledger()).unwrap();

        let button = course
            .tree
            .root()
            .element()
            .and_then(|element| element.add_button())
            .cloned()
            .unwrap();
        assert_eq!(button.category, Category::Chapter);
        course.tree.perform(OutlineAction::Add(button));
        settle(&mut course);

        let sections = course.tree.root().node().children();
        assert_eq!(sections.len(), 1);
        assert_eq!(course.tree.progress().delta_count, 1);

        let reopened = CourseStore::open(&path).unwrap();
        assert_eq!(reopened.root().children().len(), 1);
    }

    #[test]
    fn test_failed_request_shows_toast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");
        let course = OpenCourse::create(&path, &Settings::default(), memory_ledger()).unwrap();
        let mut state = AppState::with_settings(Settings::default());
        state.course = Some(course);

        if let Some(course) = state.course.as_mut() {
            course.tree.perform(OutlineAction::Delete("course".to_string()));
        }
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.ui.toast_message.is_none() && Instant::now() < deadline {
            state.poll_course(1.0);
            std::thread::sleep(Duration::from_millis(5));
        }

        let toast = state.ui.toast_message.clone().unwrap_or_default();
        assert!(toast.starts_with("Could not"), "unexpected toast: {:?}", toast);
        assert_eq!(state.ui.toast_expires_at, Some(1.0 + TOAST_DURATION * 2.0));
        assert!(!state.ui.show_error_modal);
        assert_eq!(
            state.course.as_ref().map(|course| course.tree.progress().delta_count),
            Some(0)
        );
    }
}
