//! Main application module for the outliner
//!
//! This module implements the eframe App trait, handling window management,
//! the per-frame polling of the open course, and event processing.

use crate::config::{Settings, WindowSize};
use crate::files::dialogs::{new_course_dialog, open_course_dialog};
use crate::outline::{OutlineAction, ViewState};
use crate::state::AppState;
use crate::theme::ThemeManager;
use crate::ui::{OutlinePanel, SettingsPanel};
use eframe::egui;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Application name shown in the title bar.
const APP_NAME: &str = "Course Outliner";

/// Keyboard shortcut actions that need to be deferred.
///
/// Detected inside the input closure and executed afterwards to avoid
/// borrow conflicts.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyboardAction {
    /// Open course dialog (Ctrl+O)
    Open,
    /// New course dialog (Ctrl+N)
    New,
    /// Refresh the outline (F5)
    Refresh,
    /// Open settings window (Ctrl+,)
    OpenSettings,
}

/// The main application struct that holds all state and implements eframe::App.
pub struct OutlinerApp {
    state: AppState,
    theme_manager: ThemeManager,
    outline_panel: OutlinePanel,
    settings_panel: SettingsPanel,
    /// Last known window size (for detecting changes)
    last_window_size: Option<egui::Vec2>,
    /// Last known window position (for detecting changes)
    last_window_pos: Option<egui::Pos2>,
    /// Application start time for timing toast messages
    start_time: std::time::Instant,
}

impl OutlinerApp {
    /// Create the app and open `initial_course` if given.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        initial_course: Option<PathBuf>,
    ) -> Self {
        info!("Initializing {}", APP_NAME);

        let mut theme_manager = ThemeManager::new(settings.theme);
        theme_manager.apply_if_needed(&cc.egui_ctx);

        let outline_panel = OutlinePanel::new().with_indent(settings.tree_indent);

        let mut app = Self {
            state: AppState::with_settings(settings),
            theme_manager,
            outline_panel,
            settings_panel: SettingsPanel::new(),
            last_window_size: None,
            last_window_pos: None,
            start_time: std::time::Instant::now(),
        };

        if let Some(path) = initial_course {
            app.open_course(path);
        }
        app
    }

    /// Get elapsed time since app start in seconds.
    fn get_app_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Update window size in settings if changed.
    fn update_window_state(&mut self, ctx: &egui::Context) {
        let mut changed = false;

        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                let current_size = rect.size();
                let current_pos = rect.min;

                let size_changed = self
                    .last_window_size
                    .map(|s| (s - current_size).length() > 1.0)
                    .unwrap_or(true);
                let pos_changed = self
                    .last_window_pos
                    .map(|p| (p - current_pos).length() > 1.0)
                    .unwrap_or(true);

                if size_changed || pos_changed {
                    self.last_window_size = Some(current_size);
                    self.last_window_pos = Some(current_pos);
                    changed = true;
                }
            }
        });

        if changed {
            if let (Some(size), Some(pos)) = (self.last_window_size, self.last_window_pos) {
                let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
                self.state.settings.window_size = WindowSize {
                    width: size.x,
                    height: size.y,
                    x: Some(pos.x),
                    y: Some(pos.y),
                    maximized,
                };
                debug!(
                    "Window state updated: {}x{} at ({}, {}), maximized: {}",
                    size.x, size.y, pos.x, pos.y, maximized
                );
            }
        }
    }

    /// "Course Name (file.json) - Course Outliner", or just the app name.
    fn window_title(&self) -> String {
        match &self.state.course {
            Some(course) => format!("{} - {}", course.title(), APP_NAME),
            None => APP_NAME.to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Course Handling
    // ─────────────────────────────────────────────────────────────────────────

    fn open_course(&mut self, path: PathBuf) {
        info!("Opening course: {}", path.display());
        match self.state.open_course(path.clone()) {
            Ok(()) => self.reset_outline_panel(),
            Err(e) => {
                warn!("Failed to open course {}: {}", path.display(), e);
                self.state
                    .show_error(format!("Failed to open {}:\n{}", path.display(), e));
            }
        }
    }

    /// Directory of the most recent course, for dialogs.
    fn initial_dir(&self) -> Option<PathBuf> {
        self.state
            .settings
            .recent_courses
            .first()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
    }

    fn handle_open_course(&mut self) {
        match open_course_dialog(self.initial_dir().as_deref()) {
            Some(path) => self.open_course(path),
            None => debug!("Open dialog cancelled"),
        }
    }

    fn handle_new_course(&mut self) {
        let Some(path) = new_course_dialog(self.initial_dir().as_deref()) else {
            debug!("New course dialog cancelled");
            return;
        };
        match self.state.create_course(path.clone()) {
            Ok(()) => {
                self.reset_outline_panel();
                let time = self.get_app_time();
                self.state
                    .show_toast(format!("Created {}", path.display()), time, 2.0);
            }
            Err(e) => {
                warn!("Failed to create course {}: {}", path.display(), e);
                self.state
                    .show_error(format!("Failed to create {}:\n{}", path.display(), e));
            }
        }
    }

    /// Reload the outline, keeping the focused row in view.
    fn handle_refresh(&mut self) {
        let Some(course) = self.state.course.as_mut() else {
            return;
        };
        if course.tree.navigated_to().is_some() {
            return;
        }
        match self.outline_panel.focused() {
            Some(locator) => course
                .tree
                .refresh_with_view_state(ViewState::show(locator)),
            None => course.tree.refresh(),
        }
    }

    fn handle_back_to_outline(&mut self) {
        if let Err(e) = self.state.reopen_course() {
            self.state.show_error(format!("Failed to reload the outline:\n{}", e));
        } else {
            self.reset_outline_panel();
        }
    }

    /// Fresh panel for a newly mounted tree.
    fn reset_outline_panel(&mut self) {
        self.outline_panel = OutlinePanel::new().with_indent(self.state.settings.tree_indent);
    }

    /// Apply completions, disk changes and reveals for this frame.
    fn poll_course(&mut self) {
        let time = self.get_app_time();
        self.state.poll_course(time);

        let Some(course) = self.state.course.as_mut() else {
            return;
        };
        if let Some(reveal) = course.tree.take_reveal() {
            let display_name = course
                .tree
                .root()
                .find_view(&reveal.locator)
                .map(|view| view.node().display_name.clone())
                .unwrap_or_default();
            self.outline_panel.reveal(reveal, &display_name);
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        if self.outline_panel.is_editing() {
            return;
        }
        let action = ctx.input(|i| {
            if i.modifiers.command && i.key_pressed(egui::Key::O) {
                Some(KeyboardAction::Open)
            } else if i.modifiers.command && i.key_pressed(egui::Key::N) {
                Some(KeyboardAction::New)
            } else if i.key_pressed(egui::Key::F5) {
                Some(KeyboardAction::Refresh)
            } else if i.modifiers.command && i.key_pressed(egui::Key::Comma) {
                Some(KeyboardAction::OpenSettings)
            } else {
                None
            }
        });

        match action {
            Some(KeyboardAction::Open) => self.handle_open_course(),
            Some(KeyboardAction::New) => self.handle_new_course(),
            Some(KeyboardAction::Refresh) => self.handle_refresh(),
            Some(KeyboardAction::OpenSettings) => self.state.toggle_settings(),
            None => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn render_ui(&mut self, ctx: &egui::Context) {
        let mut open_requested = false;
        let mut new_requested = false;
        let mut refresh_requested = false;
        let mut recent_to_open: Option<PathBuf> = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("📂 Open").on_hover_text("Open course (Ctrl+O)").clicked() {
                    open_requested = true;
                }
                if ui.button("🗋 New").on_hover_text("New course (Ctrl+N)").clicked() {
                    new_requested = true;
                }
                ui.menu_button("🕘 Recent", |ui| {
                    if self.state.settings.recent_courses.is_empty() {
                        ui.label(egui::RichText::new("No recent courses").weak());
                    }
                    for path in &self.state.settings.recent_courses {
                        if ui.button(path.display().to_string()).clicked() {
                            recent_to_open = Some(path.clone());
                            ui.close_menu();
                        }
                    }
                });
                ui.separator();
                let has_course = self.state.course.is_some();
                if ui
                    .add_enabled(has_course, egui::Button::new("⟳ Refresh"))
                    .on_hover_text("Reload the outline (F5)")
                    .clicked()
                {
                    refresh_requested = true;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙").on_hover_text("Settings (Ctrl+,)").clicked() {
                        self.state.toggle_settings();
                    }
                    if let Some(toast) = &self.state.ui.toast_message {
                        ui.label(egui::RichText::new(toast).italics());
                    }
                });
            });
            ui.add_space(4.0);
        });

        let colors = self.theme_manager.colors(ctx).visibility;
        let mut actions: Vec<OutlineAction> = Vec::new();
        let mut back_requested = false;

        egui::CentralPanel::default().show(ctx, |ui| match &self.state.course {
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Open or create a course to edit its outline.")
                            .size(16.0)
                            .weak(),
                    );
                });
            }
            Some(course) => match course.tree.navigated_to() {
                Some(url) => {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Editing the new unit");
                        ui.label(format!("The unit editor was opened at {}", url));
                        ui.add_space(12.0);
                        if ui.button("Back to outline").clicked() {
                            back_requested = true;
                        }
                    });
                }
                None => {
                    let output = self.outline_panel.show(ui, &course.tree, &colors);
                    actions = output.actions;
                }
            },
        });

        if let Some(course) = self.state.course.as_mut() {
            for action in actions {
                debug!("Outline action: {:?}", action);
                course.tree.perform(action);
            }
        }

        if open_requested {
            self.handle_open_course();
        }
        if new_requested {
            self.handle_new_course();
        }
        if refresh_requested {
            self.handle_refresh();
        }
        if back_requested {
            self.handle_back_to_outline();
        }
        if let Some(path) = recent_to_open {
            self.open_course(path);
        }
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if self.state.ui.show_error_modal {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new("⚠").size(24.0));
                    ui.label(&self.state.ui.error_message);
                    ui.separator();
                    if ui.button("OK").clicked() {
                        self.state.dismiss_error();
                    }
                });
        }

        if self.state.ui.show_settings {
            let output = self.settings_panel.show(ctx, &mut self.state.settings);

            if output.changed {
                self.apply_settings();
            }

            if output.reset_requested {
                let recent = std::mem::take(&mut self.state.settings.recent_courses);
                let course_file = self.state.settings.course_file.take();
                self.state.settings = Settings {
                    recent_courses: recent,
                    course_file,
                    ..Settings::default()
                };
                self.apply_settings();
                let time = self.get_app_time();
                self.state
                    .show_toast("Settings reset to defaults", time, 2.0);
            }

            if output.close_requested {
                self.state.ui.show_settings = false;
            }
        }
    }

    /// Push edited settings into the live components.
    fn apply_settings(&mut self) {
        self.theme_manager.set_theme(self.state.settings.theme);
        self.outline_panel = std::mem::take(&mut self.outline_panel)
            .with_indent(self.state.settings.tree_indent);
        self.state.mark_settings_dirty();
    }
}

impl eframe::App for OutlinerApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme_manager.apply_if_needed(ctx);

        let current_time = self.get_app_time();
        self.state.update_toast(current_time);

        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));
        self.update_window_state(ctx);

        self.poll_course();
        self.render_ui(ctx);
        self.render_dialogs(ctx);
        self.handle_keyboard_shortcuts(ctx);

        // Completions and disk changes arrive without input events
        let waiting = self
            .state
            .course
            .as_ref()
            .is_some_and(|course| course.tree.has_pending() || course.is_watching());
        if waiting || self.state.ui.toast_message.is_some() {
            ctx.request_repaint_after(Duration::from_millis(self.state.settings.poll_interval_ms));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application exiting");
        self.state.shutdown();
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        debug!("Saving application state");
        self.state.save_settings_if_dirty();
    }

    fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(30)
    }
}
