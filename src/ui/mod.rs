//! UI components for the outliner
//!
//! This module contains the egui panels drawn by the app.

mod outline_panel;
mod settings;

pub use outline_panel::OutlinePanel;
pub use settings::SettingsPanel;
