//! Configuration module for the outliner
//!
//! This module handles user preferences, their JSON serialization and
//! persistent storage in platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
