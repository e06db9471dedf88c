//! TUI module for the relnotes application.
//!
//! This module provides the interactive session: resolving the identifier,
//! picking a release, and reading its changelog.

mod app;
mod event;
mod markdown;
mod render;

pub use app::App;
pub use event::run_app;

use ratatui::style::Color;

/// Accent color for the spinner, headings, and list highlight.
pub(crate) const ACCENT: Color = Color::Indexed(205);

/// Color for secondary text (dates, footers, link targets).
pub(crate) const DIM: Color = Color::DarkGray;
