use crate::lifecycle::DisposalList;

use super::ShaderProgram;

/// GPU half of a [`ShaderProgram`]: shader modules plus the uniform buffer
/// and bind group backing the program's block at group(0) binding(0).
///
/// Created lazily on first draw; the uniform buffer is registered on the
/// owning instance's disposal list.
pub struct ProgramBinding {
    vs_module: wgpu::ShaderModule,
    fs_module: wgpu::ShaderModule,
    ubo: Option<wgpu::Buffer>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
}

impl ProgramBinding {
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        disposal: &mut DisposalList,
    ) -> Self {
        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vs", program.label())),
            source: wgpu::ShaderSource::Wgsl(program.vertex_source().into()),
        });
        // Both entry points often live in one WGSL file; reuse the module then.
        let fs_module = if program.fragment_source() == program.vertex_source() {
            vs_module.clone()
        } else {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} fs", program.label())),
                source: wgpu::ShaderSource::Wgsl(program.fragment_source().into()),
            })
        };

        let block_size = program.layout().byte_size();
        if block_size == 0 {
            return Self {
                vs_module,
                fs_module,
                ubo: None,
                bind_group_layout: None,
                bind_group: None,
            };
        }

        let ubo = disposal.track_buffer(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} ubo", program.label())),
            size: block_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} bgl", program.label())),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(block_size as u64),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} bind group", program.label())),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        Self {
            vs_module,
            fs_module,
            ubo: Some(ubo),
            bind_group_layout: Some(bind_group_layout),
            bind_group: Some(bind_group),
        }
    }

    pub fn vs_module(&self) -> &wgpu::ShaderModule {
        &self.vs_module
    }

    pub fn fs_module(&self) -> &wgpu::ShaderModule {
        &self.fs_module
    }

    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layout.as_ref()
    }

    /// Uploads the packed uniform block if any value changed this frame.
    pub fn upload(&self, queue: &wgpu::Queue, program: &mut ShaderProgram) {
        let Some(ubo) = self.ubo.as_ref() else { return };
        if !program.is_dirty() {
            return;
        }
        queue.write_buffer(ubo, 0, &program.packed_bytes());
        program.mark_clean();
    }

    /// Binds the uniform block at `index`, if the program has one.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>, index: u32) {
        if let Some(bg) = self.bind_group.as_ref() {
            rpass.set_bind_group(index, bg, &[]);
        }
    }
}
