//! Per-instance lifecycle primitives.
//!
//! Every mounted renderer owns exactly one [`AnimationHandle`] (its stop
//! switch) and one [`DisposalList`] (everything it must release on
//! unmount). The frame loop runs through a [`FrameGate`] so a callback that
//! was already queued when the handle was cancelled becomes a no-op instead
//! of touching freed resources.

mod disposal;
mod handle;

pub use disposal::DisposalList;
pub use handle::{AnimationHandle, FrameGate};
