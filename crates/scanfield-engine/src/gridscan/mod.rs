//! The grid-scan renderer: a line grid under a sweeping scan plane, with an
//! optional bloom + chromatic aberration compositor behind it.
//!
//! All scene state lives in [`ScanScene`] and is advanced CPU-side; this
//! module owns the GPU half (pipelines, vertex buffers, the compositor) and
//! the instance lifecycle (animation handle, disposal list).

use log::debug;
use winit::dpi::PhysicalSize;

use crate::color::Color;
use crate::error::EngineError;
use crate::input::PointerState;
use crate::lifecycle::{AnimationHandle, DisposalList, FrameGate};
use crate::post::{Compositor, CompositorParams};
use crate::program::ProgramBinding;
use crate::render::{additive_blend, alpha_blend, RenderCtx, RenderTarget};
use crate::scene::{
    scan_plane_vertices, LineVertex, PlaneVertex, ScanScene, ScanSceneParams, SCAN_PLANE_INDICES,
};
use crate::time::FrameTime;

/// Scene background, a near-black blue.
const BACKGROUND: Color = Color {
    r: 5.0 / 255.0,
    g: 5.0 / 255.0,
    b: 8.0 / 255.0,
};

const SCAN_PLANE_THICKNESS: f32 = 0.3;

/// Construction-time options for [`GridScan`].
///
/// Changing any of these means tearing the instance down and mounting a new
/// one; nothing here is animated at runtime.
#[derive(Debug, Clone)]
pub struct GridScanConfig {
    /// How strongly the camera leans toward the pointer.
    pub sensitivity: f32,
    pub grid_line_color: Color,
    pub scan_color: Color,
    pub scan_opacity: f32,

    /// When false no compositor (and none of its buffers) exists and the
    /// scene draws straight to the surface.
    pub enable_post_processing: bool,
    pub bloom_intensity: f32,
    pub chromatic_aberration_offset: f32,
    pub noise_intensity: f32,

    /// Half-width of the square grid in world units.
    pub grid_extent: f32,
    pub grid_divisions: u32,
    pub scan_speed: f32,
    pub scan_travel: f32,
}

impl Default for GridScanConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.55,
            grid_line_color: Color {
                r: 0x6b as f32 / 255.0,
                g: 0x5b as f32 / 255.0,
                b: 0x95 as f32 / 255.0,
            },
            scan_color: Color {
                r: 1.0,
                g: 0x9f as f32 / 255.0,
                b: 0xfc as f32 / 255.0,
            },
            scan_opacity: 0.5,
            enable_post_processing: true,
            bloom_intensity: 0.8,
            chromatic_aberration_offset: 0.002,
            noise_intensity: 0.01,
            grid_extent: 40.0,
            grid_divisions: 40,
            scan_speed: 0.8,
            scan_travel: 15.0,
        }
    }
}

impl GridScanConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let finite_nonneg = |name: &str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };
        finite_nonneg("sensitivity", self.sensitivity)?;
        finite_nonneg("bloom_intensity", self.bloom_intensity)?;
        finite_nonneg(
            "chromatic_aberration_offset",
            self.chromatic_aberration_offset,
        )?;
        finite_nonneg("noise_intensity", self.noise_intensity)?;
        finite_nonneg("scan_speed", self.scan_speed)?;
        finite_nonneg("scan_travel", self.scan_travel)?;

        if !(0.0..=1.0).contains(&self.scan_opacity) {
            return Err(EngineError::InvalidConfig(format!(
                "scan_opacity must lie in 0..=1, got {}",
                self.scan_opacity
            )));
        }
        if !self.grid_extent.is_finite() || self.grid_extent <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "grid_extent must be positive, got {}",
                self.grid_extent
            )));
        }
        if self.grid_divisions == 0 {
            return Err(EngineError::InvalidConfig(
                "grid_divisions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// GPU-side objects, created on the first rendered frame.
struct SceneGpu {
    grid_binding: ProgramBinding,
    grid_pipeline: wgpu::RenderPipeline,
    grid_vbo: wgpu::Buffer,
    grid_vertex_count: u32,

    scan_binding: ProgramBinding,
    scan_pipeline: wgpu::RenderPipeline,
    scan_vbo: wgpu::Buffer,
    scan_ibo: wgpu::Buffer,
}

/// One mounted grid-scan instance.
///
/// Construction is CPU-only (shader introspection, geometry, scene state) and
/// fails cleanly on bad config or sources; GPU resources appear on the first
/// frame and are torn down by [`dispose`](Self::dispose).
pub struct GridScan {
    scene: ScanScene,
    scan_plane: [PlaneVertex; 4],
    compositor: Option<Compositor>,
    gate: FrameGate,
    disposal: DisposalList,
    gpu: Option<SceneGpu>,
}

impl GridScan {
    pub fn new(config: &GridScanConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let scene = ScanScene::build(&ScanSceneParams {
            sensitivity: config.sensitivity,
            grid_line_color: config.grid_line_color,
            scan_color: config.scan_color,
            scan_opacity: config.scan_opacity,
            grid_extent: config.grid_extent,
            grid_divisions: config.grid_divisions,
            scan_speed: config.scan_speed,
            scan_travel: config.scan_travel,
        })?;

        // The strip spans the full grid width and sweeps along depth.
        let scan_plane = scan_plane_vertices(config.grid_extent * 2.0, SCAN_PLANE_THICKNESS);

        let compositor = if config.enable_post_processing {
            Some(Compositor::new(CompositorParams {
                bloom_intensity: config.bloom_intensity,
                chromatic_aberration_offset: config.chromatic_aberration_offset,
                noise_intensity: config.noise_intensity,
            })?)
        } else {
            None
        };

        Ok(Self {
            scene,
            scan_plane,
            compositor,
            gate: FrameGate::new(AnimationHandle::new()),
            disposal: DisposalList::new(),
            gpu: None,
        })
    }

    /// Token for cancelling this instance's animation from outside.
    pub fn handle(&self) -> &AnimationHandle {
        self.gate.handle()
    }

    /// Number of frames this instance actually rendered.
    pub fn frames_rendered(&self) -> u64 {
        self.gate.frames()
    }

    pub fn is_composited(&self) -> bool {
        self.compositor.is_some()
    }

    /// Renders one frame. A cancelled instance renders nothing, and a frame
    /// that fails cancels the instance: retrying would fail identically, so
    /// the window goes blank instead of re-running the failure forever.
    pub fn frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        time: FrameTime,
        pointer: PointerState,
    ) -> Result<(), EngineError> {
        if !self.gate.admit() {
            return Ok(());
        }
        let result = self.run_frame(ctx, target, time, pointer);
        self.finish_frame(result)
    }

    fn run_frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        time: FrameTime,
        pointer: PointerState,
    ) -> Result<(), EngineError> {
        self.scene.camera.set_aspect(ctx.aspect());
        self.scene.advance(time.elapsed, pointer)?;

        self.ensure_gpu(ctx);
        let Some(gpu) = self.gpu.as_ref() else {
            return Ok(());
        };

        gpu.grid_binding.upload(ctx.queue, &mut self.scene.grid_program);
        gpu.scan_binding.upload(ctx.queue, &mut self.scene.scan_program);

        if let Some(compositor) = self.compositor.as_mut() {
            compositor.render(
                ctx,
                target.encoder,
                target.color_view,
                BACKGROUND,
                time.elapsed,
                &mut self.disposal,
                |rpass| Self::draw_scene(gpu, rpass),
            )?;
        } else {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grid scan direct pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: BACKGROUND.r as f64,
                            g: BACKGROUND.g as f64,
                            b: BACKGROUND.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            Self::draw_scene(gpu, &mut rpass);
        }

        Ok(())
    }

    /// A failed frame permanently stops this instance.
    fn finish_frame(&mut self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        if result.is_err() {
            self.gate.handle().cancel();
        }
        result
    }

    /// Drawable size changed; the compositor replaces its buffers on the next
    /// frame from the context size, the camera updates now.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.scene
            .camera
            .set_aspect(size.width.max(1) as f32 / size.height.max(1) as f32);
    }

    /// Stops the animation and frees every GPU resource this instance
    /// created. Idempotent; other instances are unaffected.
    pub fn dispose(&mut self) {
        self.gate.handle().cancel();
        self.gpu = None;
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.dispose();
        }
        debug!("grid scan disposed ({} tracked resources)", self.disposal.live());
        self.disposal.dispose();
    }

    fn draw_scene(gpu: &SceneGpu, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(&gpu.grid_pipeline);
        gpu.grid_binding.bind(rpass, 0);
        rpass.set_vertex_buffer(0, gpu.grid_vbo.slice(..));
        rpass.draw(0..gpu.grid_vertex_count, 0..1);

        rpass.set_pipeline(&gpu.scan_pipeline);
        gpu.scan_binding.bind(rpass, 0);
        rpass.set_vertex_buffer(0, gpu.scan_vbo.slice(..));
        rpass.set_index_buffer(gpu.scan_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..SCAN_PLANE_INDICES.len() as u32, 0, 0..1);
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>) {
        if self.gpu.is_some() {
            return;
        }
        use wgpu::util::DeviceExt;
        let device = ctx.device;

        let grid_binding = ProgramBinding::new(device, &self.scene.grid_program, &mut self.disposal);
        let scan_binding = ProgramBinding::new(device, &self.scene.scan_program, &mut self.disposal);

        let grid_vertices = self.scene.grid_vertex_data();
        let grid_vbo = self.disposal.track_buffer(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("grid line vbo"),
                contents: bytemuck::cast_slice(grid_vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        let grid_vertex_count = grid_vertices.len() as u32;

        let scan_vbo = self.disposal.track_buffer(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("scan plane vbo"),
                contents: bytemuck::cast_slice(self.scan_plane.as_slice()),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        let scan_ibo = self.disposal.track_buffer(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("scan plane ibo"),
                contents: bytemuck::cast_slice(&SCAN_PLANE_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));

        let grid_pipeline = Self::build_pipeline(
            device,
            ctx.surface_format,
            "grid line pipeline",
            &grid_binding,
            LineVertex::layout(),
            wgpu::PrimitiveTopology::LineList,
            alpha_blend(),
        );
        let scan_pipeline = Self::build_pipeline(
            device,
            ctx.surface_format,
            "scan plane pipeline",
            &scan_binding,
            PlaneVertex::layout(),
            wgpu::PrimitiveTopology::TriangleList,
            additive_blend(),
        );

        self.gpu = Some(SceneGpu {
            grid_binding,
            grid_pipeline,
            grid_vbo,
            grid_vertex_count,
            scan_binding,
            scan_pipeline,
            scan_vbo,
            scan_ibo,
        });
    }

    fn build_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        label: &str,
        binding: &ProgramBinding,
        vertex_layout: wgpu::VertexBufferLayout<'_>,
        topology: wgpu::PrimitiveTopology,
        blend: wgpu::BlendState,
    ) -> wgpu::RenderPipeline {
        let mut bgls: Vec<&wgpu::BindGroupLayout> = Vec::new();
        if let Some(bgl) = binding.bind_group_layout() {
            bgls.push(bgl);
        }
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} layout")),
            bind_group_layouts: &bgls,
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: binding.vs_module(),
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout],
            },

            fragment: Some(wgpu::FragmentState {
                module: binding.fs_module(),
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Both drawables are viewed from either side.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GridScanConfig::default().validate().unwrap();
    }

    #[test]
    fn default_colors_match_the_palette() {
        let c = GridScanConfig::default();
        assert_eq!(c.grid_line_color, Color::from_hex("#6b5b95").unwrap());
        assert_eq!(c.scan_color, Color::from_hex("#ff9ffc").unwrap());
        assert_eq!(c.scan_opacity, 0.5);
        assert_eq!(c.sensitivity, 0.55);
    }

    #[test]
    fn out_of_range_opacity_is_rejected() {
        let cfg = GridScanConfig {
            scan_opacity: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn non_finite_sensitivity_is_rejected() {
        let cfg = GridScanConfig {
            sensitivity: f32::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_divisions_is_rejected() {
        let cfg = GridScanConfig {
            grid_divisions: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn direct_mode_never_builds_a_compositor() {
        let cfg = GridScanConfig {
            enable_post_processing: false,
            ..Default::default()
        };
        let gs = GridScan::new(&cfg).unwrap();
        assert!(!gs.is_composited());
    }

    #[test]
    fn composited_mode_builds_one() {
        let gs = GridScan::new(&GridScanConfig::default()).unwrap();
        assert!(gs.is_composited());
    }

    #[test]
    fn dispose_cancels_the_handle_and_is_idempotent() {
        let mut gs = GridScan::new(&GridScanConfig::default()).unwrap();
        let handle = gs.handle().clone();
        assert!(handle.is_live());

        gs.dispose();
        assert!(!handle.is_live());
        assert_eq!(gs.disposal.live(), 0);

        gs.dispose();
        assert_eq!(gs.disposal.live(), 0);
    }

    #[test]
    fn frame_error_cancels_the_instance() {
        let mut gs = GridScan::new(&GridScanConfig::default()).unwrap();
        let err: Result<(), EngineError> =
            Err(EngineError::InvalidConfig("bad frame".to_string()));

        assert!(gs.finish_frame(err).is_err());
        assert!(!gs.handle().is_live());
    }

    #[test]
    fn successful_frame_outcome_keeps_the_instance_live() {
        let mut gs = GridScan::new(&GridScanConfig::default()).unwrap();
        assert!(gs.finish_frame(Ok(())).is_ok());
        assert!(gs.handle().is_live());
        assert_eq!(gs.frames_rendered(), 0);
    }

    #[test]
    fn two_instances_have_independent_lifecycles() {
        let mut a = GridScan::new(&GridScanConfig::default()).unwrap();
        let b = GridScan::new(&GridScanConfig::default()).unwrap();

        a.dispose();
        assert!(!a.handle().is_live());
        assert!(b.handle().is_live());
    }
}
