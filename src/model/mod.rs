//! Boundary data model: source frames and export settings.

/// Source images, frames and frame-list edits.
pub mod frame;
/// Export settings, transitions and the text overlay.
pub mod settings;
