use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opaque token identifying a live frame loop.
///
/// Exactly one per mounted renderer instance. Cancellation is immediate and
/// permanent: once `cancel()` returns, no gated frame executes, even one the
/// host scheduler had already queued.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    live: Arc<AtomicBool>,
}

impl AnimationHandle {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Stops the loop. Idempotent.
    pub fn cancel(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Default for AnimationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Admits frames only while the handle is live.
///
/// Also counts admitted frames, which makes the cancellation contract
/// observable: the counter sampled after `cancel()` never advances again.
#[derive(Debug)]
pub struct FrameGate {
    handle: AnimationHandle,
    frames: u64,
}

impl FrameGate {
    pub fn new(handle: AnimationHandle) -> Self {
        Self { handle, frames: 0 }
    }

    pub fn handle(&self) -> &AnimationHandle {
        &self.handle
    }

    /// Number of frames that actually executed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Admits one frame if the handle is still live; returns whether the
    /// frame may run. Admitted frames are counted.
    pub fn admit(&mut self) -> bool {
        if !self.handle.is_live() {
            return false;
        }
        self.frames += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_admits_while_live() {
        let mut gate = FrameGate::new(AnimationHandle::new());
        assert!(gate.admit());
        assert!(gate.admit());
        assert_eq!(gate.frames(), 2);
    }

    #[test]
    fn cancel_stops_all_further_frames() {
        let handle = AnimationHandle::new();
        let mut gate = FrameGate::new(handle.clone());
        gate.admit();

        handle.cancel();

        let before = gate.frames();
        assert!(!gate.admit());
        assert_eq!(gate.frames(), before);
    }

    #[test]
    fn cancel_is_idempotent() {
        let handle = AnimationHandle::new();
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_live());
    }

    #[test]
    fn cancel_through_a_clone_is_visible() {
        let handle = AnimationHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(!handle.is_live());
    }
}
