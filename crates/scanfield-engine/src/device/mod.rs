//! GPU device + surface management.
//!
//! Creates the wgpu instance/adapter/device/queue, configures the surface,
//! and hands out per-frame encoders and views. Failure to acquire any of
//! these degrades the owning window to a blank surface rather than crashing.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
