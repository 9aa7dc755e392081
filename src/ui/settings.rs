//! Settings window for the outliner
//!
//! Edits appearance and outline behavior in place; the app persists the
//! settings when the window reports a change.

use crate::config::{Settings, Theme};
use eframe::egui::{self, RichText};

/// Result of showing the settings window.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanelOutput {
    pub changed: bool,
    pub close_requested: bool,
    pub reset_requested: bool,
}

/// Settings window state.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanel {
    /// Base URL being edited, committed when focus leaves the field
    base_url_draft: Option<String>,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the settings window. `settings` is modified for live preview.
    pub fn show(&mut self, ctx: &egui::Context, settings: &mut Settings) -> SettingsPanelOutput {
        let mut output = SettingsPanelOutput::default();
        let mut open = true;

        egui::Window::new("⚙ Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .min_width(380.0)
            .show(ctx, |ui| {
                if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    output.close_requested = true;
                }

                ui.label(RichText::new("Appearance").strong());
                ui.horizontal(|ui| {
                    ui.label("Theme:");
                    for theme in Theme::all() {
                        if ui
                            .selectable_label(settings.theme == *theme, theme.label())
                            .clicked()
                            && settings.theme != *theme
                        {
                            settings.theme = *theme;
                            output.changed = true;
                        }
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Indentation:");
                    if ui
                        .add(
                            egui::Slider::new(
                                &mut settings.tree_indent,
                                Settings::MIN_TREE_INDENT..=Settings::MAX_TREE_INDENT,
                            )
                            .suffix(" pt"),
                        )
                        .changed()
                    {
                        output.changed = true;
                    }
                });

                ui.add_space(8.0);
                ui.label(RichText::new("Outline").strong());
                if ui
                    .checkbox(
                        &mut settings.expand_all_on_load,
                        "Expand all sections when a course is opened",
                    )
                    .changed()
                {
                    output.changed = true;
                }

                ui.horizontal(|ui| {
                    ui.label("Studio URL:");
                    let draft = self.base_url_draft.get_or_insert_with(|| {
                        settings.studio_base_url.clone().unwrap_or_default()
                    });
                    let response = ui.add(
                        egui::TextEdit::singleline(draft)
                            .hint_text("https://studio.example.com")
                            .desired_width(240.0),
                    );
                    if response.lost_focus() {
                        let trimmed = draft.trim();
                        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
                        if value != settings.studio_base_url {
                            settings.studio_base_url = value;
                            output.changed = true;
                        }
                        self.base_url_draft = None;
                    }
                });
                ui.label(
                    RichText::new("New units open in the studio editor at this address.")
                        .small()
                        .weak(),
                );

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Reset to Defaults").clicked() {
                        output.reset_requested = true;
                    }
                    if ui.button("Close").clicked() {
                        output.close_requested = true;
                    }
                });
            });

        if !open {
            output.close_requested = true;
        }
        output
    }
}
