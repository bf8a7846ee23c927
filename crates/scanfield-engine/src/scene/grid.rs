use bytemuck::{Pod, Zeroable};

/// Vertex of the line grid (model space).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
}

impl LineVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Generates the line grid on the XZ plane, centered at the origin.
///
/// `extent` is the world-space span per axis, `divisions` the cell count.
/// Output is a `LineList` stream: `(divisions + 1) × 2` lines, two vertices
/// each, all in one draw call.
pub fn grid_vertices(extent: f32, divisions: u32) -> Vec<LineVertex> {
    let half = extent / 2.0;
    let spacing = extent / divisions as f32;

    let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
    for i in 0..=divisions {
        let offset = -half + i as f32 * spacing;

        // Line along X at depth `offset`.
        vertices.push(LineVertex { pos: [-half, 0.0, offset] });
        vertices.push(LineVertex { pos: [half, 0.0, offset] });

        // Line along Z at lateral position `offset`.
        vertices.push(LineVertex { pos: [offset, 0.0, -half] });
        vertices.push(LineVertex { pos: [offset, 0.0, half] });
    }
    vertices
}

/// Cosmetic yaw applied to the whole grid.
///
/// Amplitude is capped at 0.05 rad; this has no interaction semantics.
pub fn grid_yaw(elapsed: f32) -> f32 {
    (elapsed * 0.1).sin() * 0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_count_matches_line_count() {
        let v = grid_vertices(40.0, 40);
        // 41 lines per axis, 2 axes, 2 vertices per line.
        assert_eq!(v.len(), 41 * 2 * 2);
    }

    #[test]
    fn grid_spans_the_requested_extent() {
        let v = grid_vertices(40.0, 40);
        let xs: Vec<f32> = v.iter().map(|v| v.pos[0]).collect();
        let zs: Vec<f32> = v.iter().map(|v| v.pos[2]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::INFINITY, f32::min), -20.0);
        assert_eq!(xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 20.0);
        assert_eq!(zs.iter().cloned().fold(f32::INFINITY, f32::min), -20.0);
        assert_eq!(zs.iter().cloned().fold(f32::NEG_INFINITY, f32::max), 20.0);
    }

    #[test]
    fn grid_lies_flat() {
        assert!(grid_vertices(10.0, 4).iter().all(|v| v.pos[1] == 0.0));
    }

    #[test]
    fn yaw_amplitude_is_capped() {
        for i in 0..10_000 {
            let t = i as f32 * 0.01;
            assert!(grid_yaw(t).abs() <= 0.05);
        }
    }

    #[test]
    fn single_division_still_closes_the_border() {
        let v = grid_vertices(2.0, 1);
        assert_eq!(v.len(), 8);
    }
}
