use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Normalized pointer position in `[0, 1]²`.
///
/// `(0.5, 0.5)` is dead center and is the starting value, so a renderer that
/// never sees a pointer event behaves as if the pointer were centered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Shared last-write-wins pointer cell.
///
/// One writer (the event translation in the runtime) and one reader (the
/// frame callback). Reads observe the latest completed write; a write racing
/// a read may be picked up one frame later, which is acceptable for camera
/// smoothing. Components are stored as f32 bit patterns in relaxed atomics —
/// no locking, no blocking on either side.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    cell: Arc<Cell>,
}

#[derive(Debug)]
struct Cell {
    x_bits: AtomicU32,
    y_bits: AtomicU32,
}

impl PointerTracker {
    pub fn new() -> Self {
        let initial = PointerState::default();
        Self {
            cell: Arc::new(Cell {
                x_bits: AtomicU32::new(initial.x.to_bits()),
                y_bits: AtomicU32::new(initial.y.to_bits()),
            }),
        }
    }

    /// Records a pointer position, clamped to `[0, 1]` per axis.
    ///
    /// Callers pass window-relative coordinates already divided by the
    /// window size; clamping guards against positions reported slightly
    /// outside the client area during drags.
    pub fn write(&self, x: f32, y: f32) {
        self.cell
            .x_bits
            .store(x.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        self.cell
            .y_bits
            .store(y.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// Reads the most recent pointer position.
    pub fn read(&self) -> PointerState {
        PointerState {
            x: f32::from_bits(self.cell.x_bits.load(Ordering::Relaxed)),
            y: f32::from_bits(self.cell.y_bits.load(Ordering::Relaxed)),
        }
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_centered() {
        let t = PointerTracker::new();
        assert_eq!(t.read(), PointerState { x: 0.5, y: 0.5 });
    }

    #[test]
    fn last_write_wins() {
        let t = PointerTracker::new();
        t.write(0.1, 0.2);
        t.write(0.9, 0.8);
        assert_eq!(t.read(), PointerState { x: 0.9, y: 0.8 });
    }

    #[test]
    fn writes_are_clamped() {
        let t = PointerTracker::new();
        t.write(-0.5, 1.5);
        assert_eq!(t.read(), PointerState { x: 0.0, y: 1.0 });
    }

    #[test]
    fn clones_share_the_cell() {
        let writer = PointerTracker::new();
        let reader = writer.clone();
        writer.write(0.25, 0.75);
        assert_eq!(reader.read(), PointerState { x: 0.25, y: 0.75 });
    }
}
