//! File operations module
//!
//! Native dialogs for choosing course documents.

pub mod dialogs;
