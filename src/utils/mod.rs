//! Shared helpers: MIME detection, path normalization, directory walking.

pub mod mime;
pub mod path;
pub mod walk;
