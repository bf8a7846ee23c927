//! Platform window + event loop runtime.
//!
//! Owns the winit event loop, one `WindowEntry` per open window (window +
//! per-window GPU context, pointer tracker and frame clock) and the command
//! buffer applications use to open/close windows and exit.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
