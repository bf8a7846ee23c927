//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and the binary
//! mounting the renderers: an `App` trait plus the per-frame context handed
//! to it.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
