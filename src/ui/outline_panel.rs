//! Course Outline Panel Component
//!
//! Draws the rendered rows of an [`OutlineTree`] with their controls, the
//! sync progress header, the inline rename editor and reveal scrolling.
//! Clicks are returned as [`OutlineAction`]s for the app to perform.

use crate::ledger::ProgressIndicator;
use crate::outline::{Control, OutlineAction, OutlineTree, RenderedElement, RevealRequest, VisibleRow};
use crate::theme::VisibilityColors;
use eframe::egui::{self, Align, Key, Layout, RichText, ScrollArea, TextEdit, Ui, Vec2};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default indentation per outline level.
const DEFAULT_INDENT: f32 = 18.0;

/// Width reserved for the collapse arrow.
const ARROW_WIDTH: f32 = 14.0;

/// Width of the inline rename editor.
const RENAME_WIDTH: f32 = 240.0;

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// Output from the outline panel.
#[derive(Debug, Default)]
pub struct OutlinePanelOutput {
    /// Actions in the order the user triggered them
    pub actions: Vec<OutlineAction>,
}

/// Inline display-name editor state.
#[derive(Debug, Clone, PartialEq)]
struct RenameEditor {
    locator: String,
    original: String,
    text: String,
    request_focus: bool,
}

impl RenameEditor {
    fn new(locator: &str, display_name: &str) -> Self {
        Self {
            locator: locator.to_string(),
            original: display_name.to_string(),
            text: display_name.to_string(),
            request_focus: true,
        }
    }

    /// The rename to perform when the editor is committed, if any.
    fn commit(&self) -> Option<OutlineAction> {
        let name = self.text.trim();
        if name.is_empty() || name == self.original {
            return None;
        }
        Some(OutlineAction::Rename {
            locator: self.locator.clone(),
            display_name: name.to_string(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OutlinePanel
// ─────────────────────────────────────────────────────────────────────────────

/// The course outline widget.
#[derive(Debug, Clone)]
pub struct OutlinePanel {
    indent: f32,
    editing: Option<RenameEditor>,
    pending_scroll: Option<(String, f32)>,
    confirm_delete: Option<String>,
    /// Row last selected or revealed
    focused: Option<String>,
}

impl Default for OutlinePanel {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlinePanel {
    pub fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            editing: None,
            pending_scroll: None,
            confirm_delete: None,
            focused: None,
        }
    }

    pub fn with_indent(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }

    /// Whether a row is being renamed.
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Locator of the row last selected or revealed.
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Queue a reveal produced by the tree.
    pub fn reveal(&mut self, reveal: RevealRequest, display_name: &str) {
        if reveal.open_rename {
            self.editing = Some(RenameEditor::new(&reveal.locator, display_name));
        }
        self.focused = Some(reveal.locator.clone());
        self.pending_scroll = Some((reveal.locator, reveal.scroll_offset as f32));
    }

    /// Render the outline and return what the user did.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        tree: &OutlineTree,
        colors: &VisibilityColors,
    ) -> OutlinePanelOutput {
        let mut output = OutlinePanelOutput::default();

        self.render_progress(ui, tree.progress());
        ui.add_space(4.0);
        ui.separator();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.add_space(4.0);
                for row in tree.visible_rows() {
                    self.render_row(ui, &row, colors, &mut output);
                }

                let add_section = tree.root().element().and_then(RenderedElement::add_button);
                if let Some(button) = add_section {
                    ui.add_space(8.0);
                    if ui.button(format!("➕ {}", button.label)).clicked() {
                        output.actions.push(OutlineAction::Add(button.clone()));
                    }
                }
                ui.add_space(4.0);
            });

        output
    }

    /// Sync progress bar with the pending change count.
    fn render_progress(&self, ui: &mut Ui, progress: &ProgressIndicator) {
        ui.horizontal(|ui| {
            let fraction = progress.percent.unwrap_or(100.0) as f32 / 100.0;
            ui.add(
                egui::ProgressBar::new(fraction.clamp(0.0, 1.0))
                    .desired_width(180.0)
                    .show_percentage(),
            );
            ui.label(RichText::new(progress.count_label()).strong())
                .on_hover_text("Sections changed since the last sync");
            let text = RichText::new(progress.sync_label());
            if progress.all_caught_up {
                ui.label(text.weak());
            } else {
                ui.label(text);
            }
        });
    }

    /// Render one rendered element as a row.
    fn render_row(
        &mut self,
        ui: &mut Ui,
        row: &VisibleRow<'_>,
        colors: &VisibilityColors,
        output: &mut OutlinePanelOutput,
    ) {
        let element = row.element;

        if element.parent_type.is_none() {
            let response = ui.label(RichText::new(&element.display_name).size(18.0).strong());
            self.scroll_if_pending(ui, &element.locator, response.rect);
            return;
        }

        let response = ui
            .horizontal(|ui| {
                ui.add_space(row.depth.saturating_sub(1) as f32 * self.indent);

                if element.has_control(&Control::ToggleCollapse) {
                    let arrow = if element.is_collapsed { "▶" } else { "▼" };
                    if ui
                        .add(egui::Button::new(RichText::new(arrow).size(10.0)).frame(false))
                        .clicked()
                    {
                        output
                            .actions
                            .push(OutlineAction::Toggle(element.locator.clone()));
                    }
                } else {
                    ui.add_space(ARROW_WIDTH);
                }

                ui.label(
                    RichText::new("●")
                        .size(10.0)
                        .color(colors.for_class(element.visibility_class)),
                )
                .on_hover_text(visibility_label(element.visibility_class));

                self.render_name(ui, element, output);

                ui.label(RichText::new(element.type_display_name).small().weak());
                if element.has_explicit_staff_lock {
                    let lock = ui.label("🔒");
                    if let Some(message) = &element.staff_lock_message {
                        lock.on_hover_text(message);
                    }
                }

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    self.render_controls(ui, element, output);
                });
            })
            .response;

        self.scroll_if_pending(ui, &element.locator, response.rect);
    }

    fn render_name(&mut self, ui: &mut Ui, element: &RenderedElement, output: &mut OutlinePanelOutput) {
        let Some(editor) = self
            .editing
            .as_mut()
            .filter(|editor| editor.locator == element.locator)
        else {
            let selected = self.focused.as_deref() == Some(element.locator.as_str());
            let label = ui.selectable_label(selected, &element.display_name);
            if label.clicked() {
                self.focused = Some(element.locator.clone());
            }
            if label.double_clicked() && element.has_control(&Control::Rename) {
                self.editing = Some(RenameEditor::new(&element.locator, &element.display_name));
            }
            return;
        };

        let edit = ui.add(
            TextEdit::singleline(&mut editor.text)
                .id(egui::Id::new(("rename", element.locator.as_str())))
                .desired_width(RENAME_WIDTH),
        );
        if editor.request_focus {
            edit.request_focus();
            editor.request_focus = false;
        }

        let cancelled = ui.input(|i| i.key_pressed(Key::Escape));
        if edit.lost_focus() || cancelled {
            if !cancelled {
                output.actions.extend(editor.commit());
            }
            self.editing = None;
        }
    }

    fn render_controls(&mut self, ui: &mut Ui, element: &RenderedElement, output: &mut OutlinePanelOutput) {
        if self.confirm_delete.as_deref() == Some(element.locator.as_str()) {
            if ui.small_button("Cancel").clicked() {
                self.confirm_delete = None;
            }
            if ui.small_button("Delete").clicked() {
                output
                    .actions
                    .push(OutlineAction::Delete(element.locator.clone()));
                self.confirm_delete = None;
            }
            ui.label(RichText::new(format!("Delete this {}?", element.xblock_type)).small());
            return;
        }

        for control in &element.controls {
            match control {
                Control::Delete => {
                    if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                        self.confirm_delete = Some(element.locator.clone());
                    }
                }
                Control::Duplicate => {
                    if ui.small_button("⧉").on_hover_text("Duplicate").clicked() {
                        output
                            .actions
                            .push(OutlineAction::Duplicate(element.locator.clone()));
                    }
                }
                Control::Rename => {
                    if ui.small_button("✏").on_hover_text("Rename").clicked() {
                        self.editing =
                            Some(RenameEditor::new(&element.locator, &element.display_name));
                    }
                }
                Control::AddChild(button) => {
                    if ui.small_button(format!("➕ {}", button.label)).clicked() {
                        output.actions.push(OutlineAction::Add(button.clone()));
                    }
                }
                Control::ToggleCollapse => {}
            }
        }
    }

    fn scroll_if_pending(&mut self, ui: &mut Ui, locator: &str, rect: egui::Rect) {
        let Some((target, offset)) = &self.pending_scroll else {
            return;
        };
        if target == locator {
            ui.scroll_to_rect(rect.translate(Vec2::new(0.0, -offset)), Some(Align::TOP));
            self.pending_scroll = None;
        }
    }
}

fn visibility_label(class: &str) -> &'static str {
    match class {
        "is-live" => "Published and live",
        "is-ready" => "Published, not yet released",
        "has-warnings" => "Unpublished changes",
        "is-staff-only" => "Visible to staff only",
        "is-gated" => "Gated by prerequisites",
        _ => "Unscheduled",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_commit_trims_and_skips_noops() {
        let mut editor = RenameEditor::new("c1", "Week 1");
        assert_eq!(editor.commit(), None);

        editor.text = "   ".to_string();
        assert_eq!(editor.commit(), None);

        editor.text = " Week One ".to_string();
        assert_eq!(
            editor.commit(),
            Some(OutlineAction::Rename {
                locator: "c1".to_string(),
                display_name: "Week One".to_string(),
            })
        );
    }

    #[test]
    fn test_reveal_opens_rename_editor() {
        let mut panel = OutlinePanel::new();
        panel.reveal(
            RevealRequest {
                locator: "u9".to_string(),
                scroll_offset: 40,
                open_rename: true,
            },
            "Welcome",
        );
        assert!(panel.is_editing());
        assert_eq!(panel.pending_scroll, Some(("u9".to_string(), 40.0)));
        assert_eq!(panel.focused(), Some("u9"));

        let mut panel = OutlinePanel::new();
        panel.reveal(
            RevealRequest {
                locator: "c1".to_string(),
                scroll_offset: 0,
                open_rename: false,
            },
            "Week 1",
        );
        assert!(!panel.is_editing());
    }

    #[test]
    fn test_visibility_labels() {
        assert_eq!(visibility_label("has-warnings"), "Unpublished changes");
        assert_eq!(visibility_label(""), "Unscheduled");
    }
}
