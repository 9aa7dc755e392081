// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! Course Outliner - Main Entry Point
//!
//! A desktop editor for the section/subsection/unit outline of a course,
//! with remembered expand/collapse state and a persisted sync ledger.

mod app;
mod config;
mod error;
mod files;
mod ledger;
mod outline;
mod remote;
mod state;
mod theme;
mod ui;

use app::OutlinerApp;
use config::load_config;
use log::info;
use std::path::PathBuf;

/// Application name constant.
const APP_NAME: &str = "Course Outliner";

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);

    let settings = load_config();
    let window_size = settings.window_size;

    info!(
        "Window configuration: {}x{}, maximized: {}",
        window_size.width, window_size.height, window_size.maximized
    );

    // A path on the command line wins over the course opened last
    let initial_course = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.course_file.clone().filter(|path| path.exists()));

    let viewport = eframe::egui::ViewportBuilder::default()
        .with_title(APP_NAME)
        .with_inner_size([window_size.width, window_size.height])
        .with_min_inner_size([400.0, 300.0]);

    let viewport = if let (Some(x), Some(y)) = (window_size.x, window_size.y) {
        viewport.with_position([x, y])
    } else {
        viewport
    };

    let viewport = if window_size.maximized {
        viewport.with_maximized(true)
    } else {
        viewport
    };

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(OutlinerApp::new(cc, settings, initial_course)))),
    )
}
