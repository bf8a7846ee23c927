use crate::color::Color;
use crate::error::EngineError;
use crate::lifecycle::DisposalList;
use crate::program::{ProgramBinding, ShaderProgram, UniformValue};
use crate::render::{QuadBuffers, QuadVertex, RenderCtx};

use super::targets::{clamp_target_size, PostTargets};

/// Construction parameters for the composited chain.
#[derive(Debug, Clone, Copy)]
pub struct CompositorParams {
    pub bloom_intensity: f32,
    pub chromatic_aberration_offset: f32,
    pub noise_intensity: f32,
}

/// Bloom bright-pass threshold and blur spread, as tuned for the scan scene.
const BLOOM_THRESHOLD: f32 = 0.2;
const BLOOM_RADIUS: f32 = 0.4;

/// One full-screen processing stage: a program plus its lazily created
/// pipeline.
struct PostPass {
    program: ShaderProgram,
    binding: Option<ProgramBinding>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl PostPass {
    fn new(program: ShaderProgram) -> Self {
        Self {
            program,
            binding: None,
            pipeline: None,
        }
    }

    /// Creates the GPU half once. `texture_groups` is the number of
    /// texture+sampler groups following the uniform block group.
    fn ensure_gpu(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        tex_bgl: &wgpu::BindGroupLayout,
        texture_groups: usize,
        disposal: &mut DisposalList,
    ) {
        if self.pipeline.is_some() {
            return;
        }

        let binding = ProgramBinding::new(device, &self.program, disposal);

        let mut bgls: Vec<&wgpu::BindGroupLayout> = Vec::new();
        if let Some(bgl) = binding.bind_group_layout() {
            bgls.push(bgl);
        }
        for _ in 0..texture_groups {
            bgls.push(tex_bgl);
        }

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", self.program.label())),
            bind_group_layouts: &bgls,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} pipeline", self.program.label())),
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
                    format,
                    blend: None,
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

        self.binding = Some(binding);
        self.pipeline = Some(pipeline);
    }

    fn upload(&mut self, queue: &wgpu::Queue) {
        if let Some(binding) = self.binding.as_ref() {
            binding.upload(queue, &mut self.program);
        }
    }

    /// Records one full-screen pass writing into `dst`.
    fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        dst: &wgpu::TextureView,
        inputs: &[&wgpu::BindGroup],
        quad: &QuadBuffers,
    ) {
        let (Some(pipeline), Some(binding)) = (self.pipeline.as_ref(), self.binding.as_ref())
        else {
            return;
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.program.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: dst,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        binding.bind(&mut rpass, 0);
        for (i, bg) in inputs.iter().enumerate() {
            rpass.set_bind_group(1 + i as u32, *bg, &[]);
        }
        quad.draw(&mut rpass);
    }
}

/// Bind groups sampling the current target set; rebuilt whenever the targets
/// are replaced.
struct SourceBindGroups {
    scene: wgpu::BindGroup,
    bloom_a: wgpu::BindGroup,
    bloom_b: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

/// The composited pipeline: base scene render, bloom
/// (bright → blur H → blur V → additive combine) and the final chromatic
/// aberration + noise pass onto the visible surface.
///
/// Construction compiles every pass program CPU-side; GPU resources appear
/// lazily on the first rendered frame. Mode selection happens one level up:
/// a renderer in direct mode simply never constructs a `Compositor`.
pub struct Compositor {
    bright: PostPass,
    blur_h: PostPass,
    blur_v: PostPass,
    combine: PostPass,
    chroma: PostPass,

    targets: Option<PostTargets>,
    sampler: Option<wgpu::Sampler>,
    quad: Option<QuadBuffers>,
    tex_bgl: Option<wgpu::BindGroupLayout>,
    sources: Option<SourceBindGroups>,
}

impl Compositor {
    pub fn new(params: CompositorParams) -> Result<Self, EngineError> {
        let bright = ShaderProgram::compile(
            "post bright",
            include_str!("shaders/bright.wgsl"),
            include_str!("shaders/bright.wgsl"),
            &[("threshold", UniformValue::Float(BLOOM_THRESHOLD))],
        )?;

        let blur_defaults = |direction: [f32; 2]| {
            vec![
                ("direction", UniformValue::Vec2(direction)),
                ("texel", UniformValue::Vec2([0.0, 0.0])),
                ("radius", UniformValue::Float(BLOOM_RADIUS)),
            ]
        };
        let blur_src = include_str!("shaders/blur.wgsl");
        let blur_h =
            ShaderProgram::compile("post blur h", blur_src, blur_src, &blur_defaults([1.0, 0.0]))?;
        let blur_v =
            ShaderProgram::compile("post blur v", blur_src, blur_src, &blur_defaults([0.0, 1.0]))?;

        let combine = ShaderProgram::compile(
            "post combine",
            include_str!("shaders/combine.wgsl"),
            include_str!("shaders/combine.wgsl"),
            &[("intensity", UniformValue::Float(params.bloom_intensity))],
        )?;

        let chroma = ShaderProgram::compile(
            "post chroma",
            include_str!("shaders/chroma.wgsl"),
            include_str!("shaders/chroma.wgsl"),
            &[
                (
                    "offset",
                    UniformValue::Float(params.chromatic_aberration_offset),
                ),
                ("noise_intensity", UniformValue::Float(params.noise_intensity)),
                ("time", UniformValue::Float(0.0)),
            ],
        )?;

        Ok(Self {
            bright: PostPass::new(bright),
            blur_h: PostPass::new(blur_h),
            blur_v: PostPass::new(blur_v),
            combine: PostPass::new(combine),
            chroma: PostPass::new(chroma),
            targets: None,
            sampler: None,
            quad: None,
            tex_bgl: None,
            sources: None,
        })
    }

    /// Whether the intermediate buffers currently exist.
    pub fn has_targets(&self) -> bool {
        self.targets.is_some()
    }

    /// Runs the whole chain for one frame.
    ///
    /// `draw_scene` records the base scene into the first pass; the final
    /// pass writes to `surface`. Pass order is fixed; every stage reads only
    /// targets the previous stages finished writing.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
        clear: Color,
        elapsed: f32,
        disposal: &mut DisposalList,
        draw_scene: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) -> Result<(), EngineError> {
        self.ensure_targets(ctx);
        self.ensure_gpu(ctx, disposal);

        // Reseed the noise every frame so consecutive frames decorrelate.
        self.chroma
            .program
            .set_uniform("time", UniformValue::Float(elapsed))?;

        for pass in [
            &mut self.bright,
            &mut self.blur_h,
            &mut self.blur_v,
            &mut self.combine,
            &mut self.chroma,
        ] {
            pass.upload(ctx.queue);
        }

        let (Some(targets), Some(sources), Some(quad)) = (
            self.targets.as_ref(),
            self.sources.as_ref(),
            self.quad.as_ref(),
        ) else {
            return Ok(());
        };

        // Pass 1: base scene into the offscreen color buffer.
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.scene.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
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
            draw_scene(&mut rpass);
        }

        // Passes 2-5: bloom chain, then aberration + noise onto the surface.
        self.bright
            .run(encoder, &targets.bloom_a.view, &[&sources.scene], quad);
        self.blur_h
            .run(encoder, &targets.bloom_b.view, &[&sources.bloom_a], quad);
        self.blur_v
            .run(encoder, &targets.bloom_a.view, &[&sources.bloom_b], quad);
        self.combine.run(
            encoder,
            &targets.composite.view,
            &[&sources.scene, &sources.bloom_a],
            quad,
        );
        self.chroma
            .run(encoder, surface, &[&sources.composite], quad);

        Ok(())
    }

    /// Frees all intermediate buffers.
    pub fn dispose(&mut self) {
        self.sources = None;
        if let Some(targets) = self.targets.take() {
            targets.destroy();
        }
    }

    /// Replaces the whole target set when the drawable size changed.
    ///
    /// All buffers change together or not at all; a zero-sized request keeps
    /// the previous set.
    fn ensure_targets(&mut self, ctx: &RenderCtx<'_>) {
        if ctx.size.width == 0 || ctx.size.height == 0 {
            return;
        }
        let wanted = clamp_target_size(ctx.size);
        if self
            .targets
            .as_ref()
            .is_some_and(|t| t.size() == wanted)
        {
            return;
        }

        let fresh = PostTargets::create(ctx.device, ctx.surface_format, wanted);
        if let Some(old) = self.targets.replace(fresh) {
            old.destroy();
        }
        // Source bind groups reference the old textures; rebuild below.
        self.sources = None;

        // Blur step length is expressed in texels of the current size.
        let texel = [1.0 / wanted.width as f32, 1.0 / wanted.height as f32];
        // Layout is validated at compile time; these names exist.
        let _ = self
            .blur_h
            .program
            .set_uniform("texel", UniformValue::Vec2(texel));
        let _ = self
            .blur_v
            .program
            .set_uniform("texel", UniformValue::Vec2(texel));
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>, disposal: &mut DisposalList) {
        let device = ctx.device;

        if self.sampler.is_none() {
            self.sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("post sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }));
        }

        if self.quad.is_none() {
            self.quad = Some(QuadBuffers::create(device, disposal));
        }

        if self.tex_bgl.is_none() {
            self.tex_bgl = Some(device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("post source bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                },
            ));
        }

        let Some(tex_bgl) = self.tex_bgl.as_ref() else {
            return;
        };

        self.bright
            .ensure_gpu(device, ctx.surface_format, tex_bgl, 1, disposal);
        self.blur_h
            .ensure_gpu(device, ctx.surface_format, tex_bgl, 1, disposal);
        self.blur_v
            .ensure_gpu(device, ctx.surface_format, tex_bgl, 1, disposal);
        self.combine
            .ensure_gpu(device, ctx.surface_format, tex_bgl, 2, disposal);
        self.chroma
            .ensure_gpu(device, ctx.surface_format, tex_bgl, 1, disposal);

        if self.sources.is_none() {
            let (Some(targets), Some(sampler)) = (self.targets.as_ref(), self.sampler.as_ref())
            else {
                return;
            };
            let bind = |target: &super::targets::TargetTexture, label: &str| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(label),
                    layout: tex_bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&target.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            };
            self.sources = Some(SourceBindGroups {
                scene: bind(&targets.scene, "post source scene"),
                bloom_a: bind(&targets.bloom_a, "post source bloom a"),
                bloom_b: bind(&targets.bloom_b, "post source bloom b"),
                composite: bind(&targets.composite, "post source composite"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CompositorParams {
        CompositorParams {
            bloom_intensity: 0.8,
            chromatic_aberration_offset: 0.002,
            noise_intensity: 0.01,
        }
    }

    #[test]
    fn construction_compiles_all_pass_programs() {
        let c = Compositor::new(params()).unwrap();
        assert_eq!(
            c.chroma.program.uniform("offset"),
            Some(UniformValue::Float(0.002))
        );
        assert_eq!(
            c.combine.program.uniform("intensity"),
            Some(UniformValue::Float(0.8))
        );
        assert_eq!(
            c.blur_h.program.uniform("direction"),
            Some(UniformValue::Vec2([1.0, 0.0]))
        );
    }

    #[test]
    fn no_targets_exist_before_first_frame() {
        let c = Compositor::new(params()).unwrap();
        assert!(!c.has_targets());
    }

    /// CPU mirror of the shader's `random(st)` hash.
    fn shader_random(x: f32, y: f32) -> f32 {
        let v = (x * 12.9898 + y * 78.233).sin() * 43758.5453123;
        v - v.floor()
    }

    /// Coarse signature of the noise field at one time seed.
    fn noise_signature(t: f32) -> u64 {
        let mut sig = 0u64;
        for i in 0..8 {
            for j in 0..8 {
                let u = i as f32 / 8.0 + t;
                let v = j as f32 / 8.0 + t;
                if shader_random(u, v) > 0.5 {
                    sig |= 1 << (i * 8 + j);
                }
            }
        }
        sig
    }

    #[test]
    fn noise_decorrelates_between_frames() {
        // Two frames one 60 Hz tick apart must not repeat the pattern.
        assert_ne!(noise_signature(1.0), noise_signature(1.0 + 1.0 / 60.0));
    }

    #[test]
    fn grain_only_brightens() {
        // The hash lands in [0, 1); applied uncentered, grain can only add
        // light on top of the aberrated color.
        for i in 0..64 {
            let v = shader_random(i as f32 * 0.173, i as f32 * 0.311 + 0.5);
            assert!((0.0..1.0).contains(&v));
        }
        let src = include_str!("shaders/chroma.wgsl");
        assert!(src.contains("random(in.uv + vec2<f32>(u.time)) * u.noise_intensity"));
    }
}
