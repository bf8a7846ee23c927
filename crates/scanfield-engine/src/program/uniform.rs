/// Declared shape of a uniform slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Mat4,
}

impl UniformType {
    /// Byte size in the uniform address space.
    ///
    /// Note `vec3` is 12 bytes with 16-byte alignment; a trailing `f32`
    /// member packs into the fourth component.
    pub fn size(self) -> u32 {
        match self {
            UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Mat4 => 64,
        }
    }

    pub fn align(self) -> u32 {
        match self {
            UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 16,
            UniformType::Mat4 => 16,
        }
    }
}

/// A uniform value, shape-checked against the declared type on every set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    /// Column-major, as produced by `glam::Mat4::to_cols_array`.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    fn write(&self, out: &mut [u8], offset: usize) {
        let bytes: &[u8] = match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        };
        out[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

/// One named slot in a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub ty: UniformType,
    /// Byte offset inside the block, as reported by the WGSL front-end.
    pub offset: u32,
}

/// The introspected shape of a program's uniform block.
///
/// Built from shader source at compile time; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    slots: Vec<UniformSlot>,
}

impl UniformLayout {
    pub fn new(slots: Vec<UniformSlot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    /// Total block size, rounded up to the 16-byte uniform stride.
    pub fn byte_size(&self) -> u32 {
        let end = self
            .slots
            .iter()
            .map(|s| s.offset + s.ty.size())
            .max()
            .unwrap_or(0);
        end.div_ceil(16) * 16
    }

    /// Packs `values` (parallel to `slots`) into a byte block ready for
    /// `queue.write_buffer`.
    pub fn pack(&self, values: &[UniformValue]) -> Vec<u8> {
        debug_assert_eq!(values.len(), self.slots.len());
        let mut out = vec![0u8; self.byte_size() as usize];
        for (slot, value) in self.slots.iter().zip(values) {
            debug_assert_eq!(value.ty(), slot.ty);
            value.write(&mut out, slot.offset as usize);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, ty: UniformType, offset: u32) -> UniformSlot {
        UniformSlot {
            name: name.to_string(),
            ty,
            offset,
        }
    }

    // ── sizes ─────────────────────────────────────────────────────────────

    #[test]
    fn block_size_rounds_to_sixteen() {
        let layout = UniformLayout::new(vec![slot("a", UniformType::Float, 0)]);
        assert_eq!(layout.byte_size(), 16);

        let layout = UniformLayout::new(vec![
            slot("m", UniformType::Mat4, 0),
            slot("c", UniformType::Vec3, 64),
            slot("k", UniformType::Float, 76),
        ]);
        assert_eq!(layout.byte_size(), 80);
    }

    #[test]
    fn empty_layout_is_zero_sized() {
        assert_eq!(UniformLayout::default().byte_size(), 0);
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn packs_values_at_declared_offsets() {
        // vec3 at 0 with an f32 packed into its fourth component.
        let layout = UniformLayout::new(vec![
            slot("color", UniformType::Vec3, 0),
            slot("opacity", UniformType::Float, 12),
        ]);
        let bytes = layout.pack(&[
            UniformValue::Vec3([1.0, 2.0, 3.0]),
            UniformValue::Float(4.0),
        ]);
        assert_eq!(bytes.len(), 16);
        let floats: &[f32] = bytemuck::cast_slice(&bytes);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn mat4_is_column_major_contiguous() {
        let layout = UniformLayout::new(vec![slot("mvp", UniformType::Mat4, 0)]);
        let m = glam::Mat4::IDENTITY.to_cols_array();
        let bytes = layout.pack(&[UniformValue::Mat4(m)]);
        let floats: &[f32] = bytemuck::cast_slice(&bytes);
        assert_eq!(floats, &m);
    }

    #[test]
    fn index_of_finds_slots_by_name() {
        let layout = UniformLayout::new(vec![
            slot("a", UniformType::Float, 0),
            slot("b", UniformType::Vec2, 8),
        ]);
        assert_eq!(layout.index_of("b"), Some(1));
        assert_eq!(layout.index_of("missing"), None);
    }
}
