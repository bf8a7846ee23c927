//! Input subsystem.
//!
//! The renderers react to exactly one input: the pointer position,
//! normalized to `[0, 1]²` over the window. The public API is
//! platform-agnostic; the runtime translates winit cursor events into
//! writes on the shared cell.

mod pointer;

pub use pointer::{PointerState, PointerTracker};
