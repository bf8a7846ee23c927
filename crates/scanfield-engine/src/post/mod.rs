//! Post-processing compositor.
//!
//! An ordered pass chain, one command encoder per frame:
//! base scene → bright extraction → horizontal blur → vertical blur →
//! additive combine → chromatic aberration + noise → visible surface.
//! Each pass samples the previous pass's output texture; passes never run
//! out of order or concurrently within a frame.
//!
//! The compositor exists only in composited mode. Direct mode is the absence
//! of a compositor: the scene draws straight to the surface and none of the
//! intermediate targets are ever allocated.

mod compositor;
mod targets;

pub use compositor::{Compositor, CompositorParams};
pub use targets::{clamp_target_size, PostTargets};
