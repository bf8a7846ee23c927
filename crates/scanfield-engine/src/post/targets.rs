use winit::dpi::PhysicalSize;

/// Clamps a requested target size to the 1×1 floor.
///
/// Zero-sized dimensions show up transiently during teardown and window
/// minimization; intermediate buffers must never be configured at zero.
pub fn clamp_target_size(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

/// One offscreen color target (texture + render/sample view).
pub struct TargetTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TargetTexture {
    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// The full set of intermediate color buffers used by the pass chain.
///
/// Always created and resized as a unit so no pass can sample a buffer of a
/// mismatched size; a resize either replaces the whole set or (for zero
/// dimensions) keeps the previous one.
pub struct PostTargets {
    size: PhysicalSize<u32>,
    /// Base scene output; input to the bright pass and the combine pass.
    pub scene: TargetTexture,
    /// Bloom ping-pong pair.
    pub bloom_a: TargetTexture,
    pub bloom_b: TargetTexture,
    /// Combine output; input to the final chroma/noise pass.
    pub composite: TargetTexture,
}

impl PostTargets {
    pub fn create(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
    ) -> Self {
        let size = clamp_target_size(size);
        Self {
            size,
            scene: TargetTexture::create(device, "post scene target", format, size),
            bloom_a: TargetTexture::create(device, "post bloom target a", format, size),
            bloom_b: TargetTexture::create(device, "post bloom target b", format, size),
            composite: TargetTexture::create(device, "post composite target", format, size),
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Eagerly frees the GPU memory behind all four targets.
    pub fn destroy(&self) {
        self.scene.texture.destroy();
        self.bloom_a.texture.destroy();
        self.bloom_b.texture.destroy();
        self.composite.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_clamps_to_one() {
        assert_eq!(
            clamp_target_size(PhysicalSize::new(0, 0)),
            PhysicalSize::new(1, 1)
        );
        assert_eq!(
            clamp_target_size(PhysicalSize::new(0, 720)),
            PhysicalSize::new(1, 720)
        );
    }

    #[test]
    fn regular_sizes_pass_through() {
        assert_eq!(
            clamp_target_size(PhysicalSize::new(1280, 720)),
            PhysicalSize::new(1280, 720)
        );
    }
}
