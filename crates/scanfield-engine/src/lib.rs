//! Scanfield engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the two
//! decorative renderers: the grid-scan scene (grid + moving scan plane +
//! point light, optionally composited through bloom and chromatic
//! aberration) and the single-pass light-ray field.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod color;
pub mod error;
pub mod lifecycle;
pub mod program;
pub mod render;
pub mod scene;
pub mod post;

pub mod gridscan;
pub mod rays;
