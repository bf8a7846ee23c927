//! Scene graph for the grid-scan renderer.
//!
//! A deliberately flat set of objects: one line grid, one scan plane, one
//! ambient + one point light, one camera. Geometry is generated once;
//! transforms and shader uniforms are advanced every frame from elapsed time
//! and the pointer position. Everything in this module is CPU-only and
//! deterministic, which is what makes the animation functions testable.

mod camera;
mod grid;
mod light;
mod scan;
mod transform;

pub use camera::CameraRig;
pub use grid::{grid_vertices, grid_yaw, LineVertex};
pub use light::{AmbientLight, PointLight};
pub use scan::{scan_plane_vertices, scan_plane_z, PlaneVertex, SCAN_PLANE_INDICES};
pub use transform::Transform;

use crate::color::Color;
use crate::error::EngineError;
use crate::input::PointerState;
use crate::program::{ShaderProgram, UniformValue};

/// Construction parameters for [`ScanScene`].
#[derive(Debug, Clone)]
pub struct ScanSceneParams {
    pub sensitivity: f32,
    pub grid_line_color: Color,
    pub scan_color: Color,
    pub scan_opacity: f32,
    pub grid_extent: f32,
    pub grid_divisions: u32,
    pub scan_speed: f32,
    pub scan_travel: f32,
}

/// Grid height below the origin; the scan plane hovers just above the grid.
const GRID_Y: f32 = -2.0;
const SCAN_PLANE_Y: f32 = -1.9;
const SCAN_LIGHT_Y: f32 = -1.0;

/// The assembled grid + scan-plane scene.
///
/// Owns the two drawables' transforms and programs, the lights and the
/// camera. `advance` is the single per-frame mutation point; the GPU layer
/// only reads the resulting uniform values and geometry.
pub struct ScanScene {
    pub camera: CameraRig,

    pub grid_transform: Transform,
    pub grid_program: ShaderProgram,
    grid_vertices: Vec<LineVertex>,

    pub scan_transform: Transform,
    pub scan_program: ShaderProgram,

    pub ambient: AmbientLight,
    pub scan_light: PointLight,

    scan_speed: f32,
    scan_travel: f32,
}

impl ScanScene {
    /// Builds the scene and compiles both programs.
    ///
    /// Fails cleanly (nothing GPU-side exists yet) when a shader is invalid.
    pub fn build(params: &ScanSceneParams) -> Result<Self, EngineError> {
        let camera = CameraRig::new(params.sensitivity);

        let grid_vertices = grid_vertices(params.grid_extent, params.grid_divisions);
        let grid_transform = Transform::at(glam::Vec3::new(0.0, GRID_Y, 0.0));

        // Flat on the grid: the 80 x 0.3 strip is authored in XY and rotated
        // to lie in XZ, matching the scan sweep along the depth axis.
        let scan_transform = Transform {
            translation: glam::Vec3::new(0.0, SCAN_PLANE_Y, 0.0),
            rotation: glam::Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        };

        let ambient = AmbientLight {
            color: params.grid_line_color,
            intensity: 0.3,
        };
        let scan_light = PointLight {
            color: params.scan_color,
            intensity: 2.0,
            range: 15.0,
            position: glam::Vec3::new(0.0, SCAN_LIGHT_Y, 0.0),
        };

        let identity = UniformValue::Mat4(glam::Mat4::IDENTITY.to_cols_array());

        let grid_program = ShaderProgram::compile(
            "scan grid",
            include_str!("shaders/grid.wgsl"),
            include_str!("shaders/grid.wgsl"),
            &[
                ("mvp", identity),
                ("model", identity),
                ("line_color", UniformValue::Vec3(params.grid_line_color.to_array())),
                ("opacity", UniformValue::Float(0.6)),
                ("ambient_color", UniformValue::Vec3(ambient.color.to_array())),
                ("ambient_intensity", UniformValue::Float(ambient.intensity)),
                ("light_color", UniformValue::Vec3(scan_light.color.to_array())),
                ("light_intensity", UniformValue::Float(scan_light.intensity)),
                ("light_pos", UniformValue::Vec3(scan_light.position.to_array())),
                ("light_range", UniformValue::Float(scan_light.range)),
            ],
        )?;

        let scan_program = ShaderProgram::compile(
            "scan plane",
            include_str!("shaders/scan.wgsl"),
            include_str!("shaders/scan.wgsl"),
            &[
                ("mvp", identity),
                ("color", UniformValue::Vec3(params.scan_color.to_array())),
                ("opacity", UniformValue::Float(params.scan_opacity)),
                ("time", UniformValue::Float(0.0)),
            ],
        )?;

        Ok(Self {
            camera,
            grid_transform,
            grid_program,
            grid_vertices,
            scan_transform,
            scan_program,
            ambient,
            scan_light,
            scan_speed: params.scan_speed,
            scan_travel: params.scan_travel,
        })
    }

    pub fn grid_vertex_data(&self) -> &[LineVertex] {
        &self.grid_vertices
    }

    /// Advances one frame: scan sweep, light tracking, cosmetic grid yaw,
    /// camera smoothing, and all dependent uniforms.
    ///
    /// `elapsed` is total animation time in seconds; the sweep is a pure
    /// function of it.
    pub fn advance(&mut self, elapsed: f32, pointer: PointerState) -> Result<(), EngineError> {
        // Scan plane sweeps the depth axis; the point light tracks it exactly.
        let z = scan_plane_z(elapsed, self.scan_speed, self.scan_travel);
        self.scan_transform.translation.z = z;
        self.scan_light.position = glam::Vec3::new(0.0, SCAN_LIGHT_Y, z);

        self.grid_transform.rotation = glam::Quat::from_rotation_y(grid_yaw(elapsed));

        self.camera.advance(pointer);
        let view_proj = self.camera.view_proj();

        let grid_model = self.grid_transform.matrix();
        self.grid_program
            .set_uniform("mvp", UniformValue::Mat4((view_proj * grid_model).to_cols_array()))?;
        self.grid_program
            .set_uniform("model", UniformValue::Mat4(grid_model.to_cols_array()))?;
        self.grid_program
            .set_uniform("light_pos", UniformValue::Vec3(self.scan_light.position.to_array()))?;

        let scan_model = self.scan_transform.matrix();
        self.scan_program
            .set_uniform("mvp", UniformValue::Mat4((view_proj * scan_model).to_cols_array()))?;
        self.scan_program
            .set_uniform("time", UniformValue::Float(elapsed))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScanSceneParams {
        ScanSceneParams {
            sensitivity: 0.55,
            grid_line_color: Color::from_hex("#6b5b95").unwrap(),
            scan_color: Color::from_hex("#FF9FFC").unwrap(),
            scan_opacity: 0.5,
            grid_extent: 40.0,
            grid_divisions: 40,
            scan_speed: 0.8,
            scan_travel: 15.0,
        }
    }

    #[test]
    fn build_compiles_both_programs() {
        let scene = ScanScene::build(&params()).unwrap();
        assert!(scene.grid_program.uniform("mvp").is_some());
        assert!(scene.scan_program.uniform("time").is_some());
    }

    #[test]
    fn scan_position_after_one_second_is_exact() {
        let mut scene = ScanScene::build(&params()).unwrap();
        scene.advance(1.0, PointerState::default()).unwrap();
        let expected = (0.8f32).sin() * 15.0;
        assert_eq!(scene.scan_transform.translation.z, expected);
    }

    #[test]
    fn light_tracks_the_scan_plane() {
        let mut scene = ScanScene::build(&params()).unwrap();
        scene.advance(2.5, PointerState::default()).unwrap();
        assert_eq!(
            scene.scan_light.position.z,
            scene.scan_transform.translation.z
        );
    }

    #[test]
    fn advance_refreshes_time_uniform() {
        let mut scene = ScanScene::build(&params()).unwrap();
        scene.advance(3.25, PointerState::default()).unwrap();
        assert_eq!(
            scene.scan_program.uniform("time"),
            Some(UniformValue::Float(3.25))
        );
    }

    #[test]
    fn grid_yaw_stays_within_cosmetic_cap() {
        let mut scene = ScanScene::build(&params()).unwrap();
        for i in 0..200 {
            scene.advance(i as f32 * 0.37, PointerState::default()).unwrap();
            let (axis_angle, angle) = scene.grid_transform.rotation.to_axis_angle();
            let _ = axis_angle;
            assert!(angle.abs() <= 0.05 + 1e-6);
        }
    }
}
