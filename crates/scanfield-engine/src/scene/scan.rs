use bytemuck::{Pod, Zeroable};

/// Vertex of the scan plane (model space + UV).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

impl PlaneVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub const SCAN_PLANE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// The thin scan strip, authored in the XY plane.
///
/// The transform rotates it flat; UV.y runs across the strip's short axis so
/// the fragment shader can fade both edges.
pub fn scan_plane_vertices(width: f32, height: f32) -> [PlaneVertex; 4] {
    let hw = width / 2.0;
    let hh = height / 2.0;
    [
        PlaneVertex { pos: [-hw, -hh, 0.0], uv: [0.0, 0.0] },
        PlaneVertex { pos: [hw, -hh, 0.0], uv: [1.0, 0.0] },
        PlaneVertex { pos: [hw, hh, 0.0], uv: [1.0, 1.0] },
        PlaneVertex { pos: [-hw, hh, 0.0], uv: [0.0, 1.0] },
    ]
}

/// Depth-axis position of the scan plane.
///
/// Pure function of elapsed time: `sin(t × speed) × travel`.
pub fn scan_plane_z(elapsed: f32, speed: f32, travel: f32) -> f32 {
    (elapsed * speed).sin() * travel
}
