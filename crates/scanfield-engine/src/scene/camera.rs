use glam::{Mat4, Vec3};

use crate::input::PointerState;

/// Pointer offset gain applied on top of `sensitivity`.
const POINTER_SCALE: f32 = 4.0;

/// Exponential-decay interpolation constant for camera motion.
///
/// Applied once per frame; the resulting lag is intentional so fast pointer
/// motion never snaps the view.
const SMOOTHING: f32 = 0.05;

/// Perspective camera that chases a pointer-derived target.
///
/// The pointer itself is read raw; only the camera position is smoothed.
/// The camera always looks at the world origin.
#[derive(Debug, Clone)]
pub struct CameraRig {
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,

    base: Vec3,
    position: Vec3,
    sensitivity: f32,
}

impl CameraRig {
    pub fn new(sensitivity: f32) -> Self {
        let base = Vec3::new(0.0, 5.0, 10.0);
        Self {
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
            base,
            position: base,
            sensitivity,
        }
    }

    /// Recomputes the projection aspect; called from the resize path.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(f32::EPSILON);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Target offset for a normalized pointer position.
    ///
    /// Dead center maps to `(0, 0)`; the corners map to
    /// `±sensitivity × 4 × 0.5` on each axis.
    pub fn target_offset(&self, pointer: PointerState) -> (f32, f32) {
        (
            (pointer.x - 0.5) * self.sensitivity * POINTER_SCALE,
            (pointer.y - 0.5) * self.sensitivity * POINTER_SCALE,
        )
    }

    /// Smoothly moves the camera toward the pointer-derived target.
    ///
    /// Horizontal pointer motion shifts the camera sideways; vertical motion
    /// pushes it along the depth axis relative to its base distance.
    pub fn advance(&mut self, pointer: PointerState) {
        let (dx, dz) = self.target_offset(pointer);
        let target_x = self.base.x + dx;
        let target_z = self.base.z + dz;

        self.position.x += (target_x - self.position.x) * SMOOTHING;
        self.position.z += (target_z - self.position.z) * SMOOTHING;
    }

    /// Combined projection × view matrix for the current frame.
    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(x: f32, y: f32) -> PointerState {
        PointerState { x, y }
    }

    // ── target offset ─────────────────────────────────────────────────────

    #[test]
    fn centered_pointer_has_zero_offset() {
        let rig = CameraRig::new(0.55);
        assert_eq!(rig.target_offset(pointer(0.5, 0.5)), (0.0, 0.0));
    }

    #[test]
    fn corner_pointer_has_maximum_offset() {
        let sensitivity = 0.55;
        let rig = CameraRig::new(sensitivity);
        let (dx, dz) = rig.target_offset(pointer(1.0, 1.0));
        let max = sensitivity * POINTER_SCALE * 0.5;
        assert!((dx - max).abs() < 1e-6);
        assert!((dz - max).abs() < 1e-6);
    }

    #[test]
    fn opposite_corner_is_negative() {
        let rig = CameraRig::new(1.0);
        let (dx, dz) = rig.target_offset(pointer(0.0, 0.0));
        assert!(dx < 0.0 && dz < 0.0);
    }

    // ── smoothing ─────────────────────────────────────────────────────────

    #[test]
    fn advance_does_not_snap() {
        let mut rig = CameraRig::new(1.0);
        let start = rig.position();
        rig.advance(pointer(1.0, 0.5));
        let after = rig.position();
        // One step covers exactly the smoothing fraction of the distance.
        let (dx, _) = rig.target_offset(pointer(1.0, 0.5));
        assert!((after.x - start.x - dx * SMOOTHING).abs() < 1e-6);
    }

    #[test]
    fn advance_converges_to_target() {
        let mut rig = CameraRig::new(1.0);
        for _ in 0..2000 {
            rig.advance(pointer(1.0, 1.0));
        }
        let (dx, dz) = rig.target_offset(pointer(1.0, 1.0));
        assert!((rig.position().x - dx).abs() < 1e-3);
        assert!((rig.position().z - (10.0 + dz)).abs() < 1e-3);
    }

    #[test]
    fn height_never_changes() {
        let mut rig = CameraRig::new(1.0);
        for _ in 0..100 {
            rig.advance(pointer(0.0, 1.0));
        }
        assert_eq!(rig.position().y, 5.0);
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn view_proj_is_finite_for_sane_aspects() {
        let mut rig = CameraRig::new(0.55);
        for aspect in [0.1f32, 1.0, 2.39] {
            rig.set_aspect(aspect);
            let m = rig.view_proj();
            assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn zero_aspect_is_clamped() {
        let mut rig = CameraRig::new(0.55);
        rig.set_aspect(0.0);
        let m = rig.view_proj();
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
