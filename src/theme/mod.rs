//! Theme System for the outliner
//!
//! `ThemeColors` holds the light and dark palettes used by the outline
//! panel, including the colors that mark each publishing state. The
//! `Theme` enum in `config::settings` (Light/Dark/System) selects which
//! palette is active at runtime; [`ThemeManager`] applies it to egui.

pub mod manager;

pub use manager::ThemeManager;

use crate::config::Theme;
use eframe::egui::{Color32, Rounding, Stroke, Visuals};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Colors for the whole application.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    pub background: Color32,
    pub background_secondary: Color32,
    pub border: Color32,
    pub selected: Color32,
    pub accent: Color32,
    pub error: Color32,
    pub warning: Color32,
    /// Dots drawn next to each outline row
    pub visibility: VisibilityColors,
}

impl ThemeColors {
    /// Palette for the given theme; `System` follows `visuals.dark_mode`.
    pub fn from_theme(theme: Theme, visuals: &Visuals) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
            Theme::System => {
                if visuals.dark_mode {
                    Self::dark()
                } else {
                    Self::light()
                }
            }
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(255, 255, 255),
            background_secondary: Color32::from_rgb(247, 247, 247),
            border: Color32::from_rgb(205, 205, 205),
            selected: Color32::from_rgb(225, 238, 255),
            accent: Color32::from_rgb(0, 110, 200),
            error: Color32::from_rgb(200, 40, 40),
            warning: Color32::from_rgb(200, 120, 0),
            visibility: VisibilityColors::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(30, 30, 30),
            background_secondary: Color32::from_rgb(40, 40, 40),
            border: Color32::from_rgb(70, 70, 70),
            selected: Color32::from_rgb(40, 60, 90),
            accent: Color32::from_rgb(80, 160, 240),
            error: Color32::from_rgb(240, 90, 90),
            warning: Color32::from_rgb(240, 170, 60),
            visibility: VisibilityColors::dark(),
        }
    }

    /// Dark themes have darker backgrounds.
    pub fn is_dark(&self) -> bool {
        self.background.r() < 128
    }

    /// egui visuals styled with this palette.
    pub fn to_visuals(&self) -> Visuals {
        let mut visuals = if self.is_dark() {
            Visuals::dark()
        } else {
            Visuals::light()
        };

        visuals.panel_fill = self.background;
        visuals.window_fill = self.background;
        visuals.faint_bg_color = self.background_secondary;
        visuals.warn_fg_color = self.warning;
        visuals.error_fg_color = self.error;
        visuals.hyperlink_color = self.accent;

        visuals.selection.bg_fill = self.selected;
        visuals.selection.stroke = Stroke::new(1.0, self.accent);

        visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, self.border);
        visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, self.border);
        for widget in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
        ] {
            widget.rounding = Rounding::same(4.0);
        }
        visuals.window_rounding = Rounding::same(8.0);

        visuals
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visibility Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Colors keyed by the visibility class of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityColors {
    pub live: Color32,
    pub ready: Color32,
    pub needs_attention: Color32,
    pub staff_only: Color32,
    pub gated: Color32,
    pub unscheduled: Color32,
}

impl VisibilityColors {
    pub fn light() -> Self {
        Self {
            live: Color32::from_rgb(0, 150, 80),
            ready: Color32::from_rgb(30, 120, 200),
            needs_attention: Color32::from_rgb(230, 140, 0),
            staff_only: Color32::from_rgb(30, 30, 30),
            gated: Color32::from_rgb(140, 80, 200),
            unscheduled: Color32::from_rgb(170, 170, 170),
        }
    }

    pub fn dark() -> Self {
        Self {
            live: Color32::from_rgb(60, 190, 120),
            ready: Color32::from_rgb(90, 160, 235),
            needs_attention: Color32::from_rgb(240, 170, 60),
            staff_only: Color32::from_rgb(220, 220, 220),
            gated: Color32::from_rgb(175, 130, 230),
            unscheduled: Color32::from_rgb(110, 110, 110),
        }
    }

    /// Color for a visibility class such as `is-live`.
    pub fn for_class(&self, class: &str) -> Color32 {
        match class {
            "is-live" => self.live,
            "is-ready" => self.ready,
            "has-warnings" => self.needs_attention,
            "is-staff-only" => self.staff_only,
            "is-gated" => self.gated,
            _ => self.unscheduled,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_theme_follows_system_visuals() {
        assert!(ThemeColors::from_theme(Theme::System, &Visuals::dark()).is_dark());
        assert!(!ThemeColors::from_theme(Theme::System, &Visuals::light()).is_dark());
        assert!(ThemeColors::from_theme(Theme::Dark, &Visuals::light()).is_dark());
    }

    #[test]
    fn test_to_visuals_dark_mode() {
        assert!(ThemeColors::dark().to_visuals().dark_mode);
        assert!(!ThemeColors::light().to_visuals().dark_mode);
    }

    #[test]
    fn test_visibility_for_class() {
        let colors = VisibilityColors::light();
        assert_eq!(colors.for_class("is-live"), colors.live);
        assert_eq!(colors.for_class("has-warnings"), colors.needs_attention);
        assert_eq!(colors.for_class(""), colors.unscheduled);
        assert_eq!(colors.for_class("something-else"), colors.unscheduled);
    }
}
