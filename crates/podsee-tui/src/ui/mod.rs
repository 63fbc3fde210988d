//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: colour palette and text styles
//! - `tabs`: per-tab content (search, results, discussion, admin)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
