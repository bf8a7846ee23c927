//! The light-ray renderer: a single full-screen pass fanning animated rays
//! out of an origin point.
//!
//! Unlike the grid scan there is no scene graph and no compositor; the whole
//! effect is one fragment shader. The CPU side's only animation state is the
//! smoothed origin point.

use log::debug;
use winit::dpi::PhysicalSize;

use crate::color::Color;
use crate::error::EngineError;
use crate::input::PointerState;
use crate::lifecycle::{AnimationHandle, DisposalList, FrameGate};
use crate::program::{ProgramBinding, ShaderProgram, UniformValue};
use crate::render::{alpha_blend, QuadBuffers, QuadVertex, RenderCtx, RenderTarget};
use crate::time::FrameTime;

/// Fixed origin presets used when the pointer is not followed, and the
/// snap-back target when following is switched off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RaysOrigin {
    #[default]
    Center,
    TopCenter,
}

impl RaysOrigin {
    /// Preset position in uv space (origin bottom-left, y up).
    pub fn uv(self) -> [f32; 2] {
        match self {
            RaysOrigin::Center => [0.5, 0.5],
            RaysOrigin::TopCenter => [0.5, 1.0],
        }
    }
}

/// Construction-time options for [`LightRays`].
#[derive(Debug, Clone)]
pub struct LightRaysConfig {
    pub color: Color,
    pub speed: f32,
    /// Angular width of each ray lobe, in `0..=1`.
    pub spread: f32,
    /// Radial reach of the rays in uv units.
    pub ray_length: f32,
    pub origin: RaysOrigin,
    pub follow_mouse: bool,
    /// Per-frame smoothing factor toward the pointer, in `0..=1`.
    pub mouse_influence: f32,
    pub noise_scale: f32,
    pub distortion: f32,
    pub fade: f32,
    pub saturation: f32,
}

impl Default for LightRaysConfig {
    fn default() -> Self {
        Self {
            color: Color::new(1.0, 1.0, 1.0),
            speed: 1.0,
            spread: 0.5,
            ray_length: 3.0,
            origin: RaysOrigin::Center,
            follow_mouse: true,
            mouse_influence: 0.1,
            noise_scale: 0.0,
            distortion: 0.0,
            fade: 1.0,
            saturation: 1.0,
        }
    }
}

impl LightRaysConfig {
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
        finite_nonneg("speed", self.speed)?;
        finite_nonneg("noise_scale", self.noise_scale)?;
        finite_nonneg("distortion", self.distortion)?;
        finite_nonneg("fade", self.fade)?;
        finite_nonneg("saturation", self.saturation)?;

        if !(0.0..=1.0).contains(&self.spread) {
            return Err(EngineError::InvalidConfig(format!(
                "spread must lie in 0..=1, got {}",
                self.spread
            )));
        }
        if !(0.0..=1.0).contains(&self.mouse_influence) {
            return Err(EngineError::InvalidConfig(format!(
                "mouse_influence must lie in 0..=1, got {}",
                self.mouse_influence
            )));
        }
        if !self.ray_length.is_finite() || self.ray_length <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "ray_length must be positive, got {}",
                self.ray_length
            )));
        }
        if !self.color.is_finite() {
            return Err(EngineError::InvalidConfig("color must be finite".to_string()));
        }
        Ok(())
    }
}

struct RaysGpu {
    binding: ProgramBinding,
    pipeline: wgpu::RenderPipeline,
    quad: QuadBuffers,
}

/// One mounted light-ray instance.
pub struct LightRays {
    program: ShaderProgram,
    origin: [f32; 2],
    follow_mouse: bool,
    mouse_influence: f32,
    preset: RaysOrigin,
    gate: FrameGate,
    disposal: DisposalList,
    gpu: Option<RaysGpu>,
}

impl LightRays {
    pub fn new(config: &LightRaysConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let src = include_str!("shaders/rays.wgsl");
        let program = ShaderProgram::compile(
            "light rays",
            src,
            src,
            &[
                ("color", UniformValue::Vec3(config.color.to_array())),
                ("time", UniformValue::Float(0.0)),
                ("origin", UniformValue::Vec2(config.origin.uv())),
                ("resolution", UniformValue::Vec2([1.0, 1.0])),
                ("speed", UniformValue::Float(config.speed)),
                ("spread", UniformValue::Float(config.spread)),
                ("ray_length", UniformValue::Float(config.ray_length)),
                ("noise_scale", UniformValue::Float(config.noise_scale)),
                ("distortion", UniformValue::Float(config.distortion)),
                ("fade", UniformValue::Float(config.fade)),
                ("saturation", UniformValue::Float(config.saturation)),
            ],
        )?;

        Ok(Self {
            program,
            origin: config.origin.uv(),
            follow_mouse: config.follow_mouse,
            mouse_influence: config.mouse_influence,
            preset: config.origin,
            gate: FrameGate::new(AnimationHandle::new()),
            disposal: DisposalList::new(),
            gpu: None,
        })
    }

    pub fn handle(&self) -> &AnimationHandle {
        self.gate.handle()
    }

    /// Number of frames this instance actually rendered.
    pub fn frames_rendered(&self) -> u64 {
        self.gate.frames()
    }

    /// Current smoothed origin in uv space.
    pub fn origin(&self) -> [f32; 2] {
        self.origin
    }

    /// Switches pointer following on or off at runtime. Turning it off snaps
    /// the origin back to the preset instantly.
    pub fn set_follow_mouse(&mut self, follow: bool) {
        self.follow_mouse = follow;
        if !follow {
            self.origin = self.preset.uv();
        }
    }

    /// Advances the origin one frame.
    ///
    /// Pointer coordinates arrive y-down; ray uv space is y-up, so the target
    /// flips y. Preset origins snap, the pointer target is approached by the
    /// configured fraction per frame.
    pub fn advance_origin(&mut self, pointer: PointerState) {
        if !self.follow_mouse {
            self.origin = self.preset.uv();
            return;
        }
        let target = [pointer.x, 1.0 - pointer.y];
        self.origin[0] += (target[0] - self.origin[0]) * self.mouse_influence;
        self.origin[1] += (target[1] - self.origin[1]) * self.mouse_influence;
    }

    /// Renders one frame. A cancelled instance renders nothing, and a frame
    /// that fails cancels the instance rather than re-running the failure.
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
        self.advance_origin(pointer);
        self.program
            .set_uniform("time", UniformValue::Float(time.elapsed))?;
        self.program
            .set_uniform("origin", UniformValue::Vec2(self.origin))?;
        self.program.set_uniform(
            "resolution",
            UniformValue::Vec2([ctx.size.width as f32, ctx.size.height as f32]),
        )?;

        self.ensure_gpu(ctx);
        let Some(gpu) = self.gpu.as_ref() else {
            return Ok(());
        };
        gpu.binding.upload(ctx.queue, &mut self.program);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("light rays pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&gpu.pipeline);
        gpu.binding.bind(&mut rpass, 0);
        gpu.quad.draw(&mut rpass);

        Ok(())
    }

    /// A failed frame permanently stops this instance.
    fn finish_frame(&mut self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        if result.is_err() {
            self.gate.handle().cancel();
        }
        result
    }

    /// Nothing here depends on the drawable size beyond the resolution
    /// uniform, which refreshes every frame.
    pub fn resize(&mut self, _size: PhysicalSize<u32>) {}

    /// Stops the animation and frees this instance's GPU resources.
    pub fn dispose(&mut self) {
        self.gate.handle().cancel();
        self.gpu = None;
        debug!("light rays disposed ({} tracked resources)", self.disposal.live());
        self.disposal.dispose();
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>) {
        if self.gpu.is_some() {
            return;
        }
        let device = ctx.device;

        let binding = ProgramBinding::new(device, &self.program, &mut self.disposal);
        let quad = QuadBuffers::create(device, &mut self.disposal);

        let mut bgls: Vec<&wgpu::BindGroupLayout> = Vec::new();
        if let Some(bgl) = binding.bind_group_layout() {
            bgls.push(bgl);
        }
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("light rays pipeline layout"),
            bind_group_layouts: &bgls,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("light rays pipeline"),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: binding.vs_module(),
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: binding.fs_module(),
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.gpu = Some(RaysGpu {
            binding,
            pipeline,
            quad,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        LightRaysConfig::default().validate().unwrap();
    }

    #[test]
    fn construction_introspects_every_uniform() {
        let rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        for name in [
            "color",
            "time",
            "origin",
            "resolution",
            "speed",
            "spread",
            "ray_length",
            "noise_scale",
            "distortion",
            "fade",
            "saturation",
        ] {
            assert!(rays.program.uniform(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn out_of_range_spread_is_rejected() {
        let cfg = LightRaysConfig {
            spread: 1.5,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_length_is_rejected() {
        let cfg = LightRaysConfig {
            ray_length: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    // ── origin animation ──────────────────────────────────────────────────

    #[test]
    fn preset_origin_ignores_the_pointer() {
        let cfg = LightRaysConfig {
            follow_mouse: false,
            origin: RaysOrigin::TopCenter,
            ..Default::default()
        };
        let mut rays = LightRays::new(&cfg).unwrap();
        rays.advance_origin(PointerState { x: 0.1, y: 0.9 });
        assert_eq!(rays.origin(), [0.5, 1.0]);
    }

    #[test]
    fn pointer_target_flips_y() {
        let cfg = LightRaysConfig {
            mouse_influence: 1.0,
            ..Default::default()
        };
        let mut rays = LightRays::new(&cfg).unwrap();
        // Pointer at the window's top edge lands at uv y = 1.
        rays.advance_origin(PointerState { x: 0.25, y: 0.0 });
        assert_eq!(rays.origin(), [0.25, 1.0]);
    }

    #[test]
    fn origin_moves_by_the_influence_fraction() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        // Start at center; target is (1, 1) after the y flip.
        rays.advance_origin(PointerState { x: 1.0, y: 0.0 });
        assert!((rays.origin()[0] - 0.55).abs() < 1e-6);
        assert!((rays.origin()[1] - 0.55).abs() < 1e-6);
    }

    #[test]
    fn origin_converges_to_the_pointer() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        for _ in 0..500 {
            rays.advance_origin(PointerState { x: 0.8, y: 0.3 });
        }
        assert!((rays.origin()[0] - 0.8).abs() < 1e-3);
        assert!((rays.origin()[1] - 0.7).abs() < 1e-3);
    }

    #[test]
    fn disabling_follow_snaps_back_to_the_preset() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        for _ in 0..50 {
            rays.advance_origin(PointerState { x: 0.9, y: 0.9 });
        }
        assert_ne!(rays.origin(), [0.5, 0.5]);

        rays.set_follow_mouse(false);
        assert_eq!(rays.origin(), [0.5, 0.5]);
    }

    #[test]
    fn ray_space_is_y_up() {
        // The origin presets and the pointer flip both live in y-up screen
        // space; the vertex stage must pass the quad position through
        // unflipped. A texture-style `1.0 - pos.y` here puts the top-center
        // preset at the bottom of the window and mirrors pointer following.
        let src = include_str!("shaders/rays.wgsl");
        assert!(src.contains("out.uv = pos;"));
        assert!(!src.contains("1.0 - pos.y"));
    }

    #[test]
    fn noise_field_is_fixed_in_screen_space() {
        // The distortion noise is a static field sampled per pixel; only the
        // sine wave animates (through `u.time`). Feeding time into the noise
        // lookup makes the rays shimmer instead of sweep.
        let src = include_str!("shaders/rays.wgsl");
        assert!(src.contains("value_noise(in.uv * u.noise_scale)"));
        assert!(!src.contains("value_noise(in.uv * u.noise_scale +"));
    }

    #[test]
    fn frame_error_cancels_the_instance() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        let err: Result<(), EngineError> =
            Err(EngineError::InvalidConfig("bad frame".to_string()));

        assert!(rays.finish_frame(err).is_err());
        assert!(!rays.handle().is_live());
    }

    #[test]
    fn successful_frame_outcome_keeps_the_instance_live() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        assert!(rays.finish_frame(Ok(())).is_ok());
        assert!(rays.handle().is_live());
        assert_eq!(rays.frames_rendered(), 0);
    }

    #[test]
    fn dispose_cancels_the_handle() {
        let mut rays = LightRays::new(&LightRaysConfig::default()).unwrap();
        let handle = rays.handle().clone();
        rays.dispose();
        assert!(!handle.is_live());
        assert_eq!(rays.disposal.live(), 0);
    }
}
