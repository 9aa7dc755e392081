//! User settings for the outliner
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::System => "System",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Light, Theme::Dark, Theme::System]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window Size Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Window dimensions and position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default)]
    pub maximized: bool,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 700.0,
            x: None,
            y: None,
            maximized: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// All persisted preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub window_size: WindowSize,

    /// Course document opened last
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_file: Option<PathBuf>,
    /// Recently opened course documents, most recent first
    pub recent_courses: Vec<PathBuf>,
    pub max_recent_courses: usize,

    /// Base URL of the studio that unit editor links open in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio_base_url: Option<String>,

    /// Expand every section and subsection when a course is opened
    pub expand_all_on_load: bool,
    /// Indentation per outline level, in points
    pub tree_indent: f32,
    /// How often the outline checks for finished requests while idle
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            window_size: WindowSize::default(),
            course_file: None,
            recent_courses: Vec::new(),
            max_recent_courses: 10,
            studio_base_url: None,
            expand_all_on_load: true,
            tree_indent: 18.0,
            poll_interval_ms: 100,
        }
    }
}

impl Settings {
    /// Remember `path` as the current course and move it to the front of the
    /// recent list.
    pub fn add_recent_course(&mut self, path: PathBuf) {
        self.recent_courses.retain(|p| p != &path);
        self.recent_courses.insert(0, path.clone());
        self.recent_courses.truncate(self.max_recent_courses);
        self.course_file = Some(path);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    pub const MIN_WINDOW_SIZE: f32 = 200.0;
    pub const MAX_WINDOW_SIZE: f32 = 10000.0;
    pub const MIN_TREE_INDENT: f32 = 8.0;
    pub const MAX_TREE_INDENT: f32 = 48.0;
    pub const MIN_POLL_INTERVAL_MS: u64 = 16;
    pub const MAX_POLL_INTERVAL_MS: u64 = 2000;

    /// Clamp values to valid ranges after loading a hand-edited file.
    pub fn sanitize(&mut self) {
        self.window_size.width = self
            .window_size
            .width
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);
        self.window_size.height = self
            .window_size
            .height
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);

        if self.max_recent_courses == 0 {
            self.max_recent_courses = 10;
        } else if self.max_recent_courses > 100 {
            self.max_recent_courses = 100;
        }
        self.recent_courses.truncate(self.max_recent_courses);

        self.tree_indent = self
            .tree_indent
            .clamp(Self::MIN_TREE_INDENT, Self::MAX_TREE_INDENT);
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(Self::MIN_POLL_INTERVAL_MS, Self::MAX_POLL_INTERVAL_MS);

        if self
            .studio_base_url
            .as_ref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.studio_base_url = None;
        }
    }

    /// Deserialize and sanitize.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
