//! Time subsystem.
//!
//! Frame timing for the per-instance animation loops. Intended usage:
//! - one `FrameClock` per window (or per render loop)
//! - call `tick()` once per presented frame to obtain `FrameTime`
//!
//! Besides the clamped per-frame delta, the clock accumulates total elapsed
//! time; the scan-plane and ray animations are pure functions of that value,
//! which keeps them deterministic under a simulated clock.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
