use crate::error::{EngineError, ShaderStage};

use super::uniform::{UniformLayout, UniformSlot, UniformType, UniformValue};

/// A compiled vertex/fragment program with a typed uniform block.
///
/// Structural shape (sources, layout) never changes after `compile`;
/// only uniform values do, via [`set_uniform`](Self::set_uniform).
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    vertex_source: String,
    fragment_source: String,
    layout: UniformLayout,
    values: Vec<UniformValue>,
    dirty: bool,
}

impl ShaderProgram {
    /// Parses both WGSL sources, introspects the group(0) uniform block and
    /// checks it against `defaults`.
    ///
    /// Fails before any GPU object exists:
    /// - `Compile` when a source is rejected (the error carries the full
    ///   diagnostic log) or when the two stages declare disagreeing blocks;
    /// - `Compile` when a block member is missing from `defaults` (a shader
    ///   uniform with no backing value would make the first draw undefined);
    /// - `UnknownUniform` when `defaults` names something no stage declares;
    /// - `TypeMismatch` when a default's shape disagrees with the source.
    pub fn compile(
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        defaults: &[(&str, UniformValue)],
    ) -> Result<Self, EngineError> {
        let vs_block = introspect(label, ShaderStage::Vertex, vertex_source)?;
        let fs_block = introspect(label, ShaderStage::Fragment, fragment_source)?;

        let layout = match (vs_block, fs_block) {
            (Some(vs), Some(fs)) => {
                if vs != fs {
                    return Err(EngineError::Compile {
                        label: label.to_string(),
                        stage: ShaderStage::Fragment,
                        log: "vertex and fragment stages declare different uniform blocks"
                            .to_string(),
                    });
                }
                UniformLayout::new(vs)
            }
            (Some(slots), None) | (None, Some(slots)) => UniformLayout::new(slots),
            (None, None) => UniformLayout::default(),
        };

        // Every declared slot needs a default before first draw.
        let mut values = Vec::with_capacity(layout.slots().len());
        for slot in layout.slots() {
            let Some((_, value)) = defaults.iter().find(|(n, _)| *n == slot.name) else {
                return Err(EngineError::Compile {
                    label: label.to_string(),
                    stage: ShaderStage::Fragment,
                    log: format!("uniform '{}' has no default value", slot.name),
                });
            };
            if value.ty() != slot.ty {
                return Err(EngineError::TypeMismatch {
                    name: slot.name.clone(),
                    expected: slot.ty,
                    got: value.ty(),
                });
            }
            values.push(*value);
        }

        // And every default must correspond to a declared slot.
        for (name, _) in defaults {
            if layout.index_of(name).is_none() {
                return Err(EngineError::UnknownUniform {
                    program: label.to_string(),
                    name: (*name).to_string(),
                });
            }
        }

        Ok(Self {
            label: label.to_string(),
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            layout,
            values,
            dirty: true,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Updates an existing uniform value. No implicit coercion.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), EngineError> {
        let Some(index) = self.layout.index_of(name) else {
            return Err(EngineError::UnknownUniform {
                program: self.label.clone(),
                name: name.to_string(),
            });
        };

        let expected = self.layout.slots()[index].ty;
        if value.ty() != expected {
            return Err(EngineError::TypeMismatch {
                name: name.to_string(),
                expected,
                got: value.ty(),
            });
        }

        if self.values[index] != value {
            self.values[index] = value;
            self.dirty = true;
        }
        Ok(())
    }

    /// Reads a current uniform value.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.layout.index_of(name).map(|i| self.values[i])
    }

    /// Whether values changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Packs the current values into a GPU-ready byte block.
    pub fn packed_bytes(&self) -> Vec<u8> {
        self.layout.pack(&self.values)
    }
}

/// Parses one stage and extracts its uniform block, if any.
fn introspect(
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<Option<Vec<UniformSlot>>, EngineError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| EngineError::Compile {
        label: label.to_string(),
        stage,
        log: err.emit_to_string(source),
    })?;

    let compile_err = |log: String| EngineError::Compile {
        label: label.to_string(),
        stage,
        log,
    };

    let mut block: Option<Vec<UniformSlot>> = None;

    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        if block.is_some() {
            return Err(compile_err(
                "more than one uniform block; programs use a single group(0) block".to_string(),
            ));
        }

        let naga::TypeInner::Struct { members, .. } = &module.types[var.ty].inner else {
            return Err(compile_err(
                "uniform global must be a struct block".to_string(),
            ));
        };

        let mut slots = Vec::with_capacity(members.len());
        for member in members {
            let name = member
                .name
                .clone()
                .ok_or_else(|| compile_err("uniform block member has no name".to_string()))?;
            let ty = map_member_type(&module.types[member.ty].inner).ok_or_else(|| {
                compile_err(format!(
                    "uniform '{name}' has an unsupported type (expected f32, vec2, vec3 or mat4x4)"
                ))
            })?;
            slots.push(UniformSlot {
                name,
                ty,
                offset: member.offset,
            });
        }
        block = Some(slots);
    }

    Ok(block)
}

fn map_member_type(inner: &naga::TypeInner) -> Option<UniformType> {
    let is_f32 = |s: &naga::Scalar| s.kind == naga::ScalarKind::Float && s.width == 4;
    match inner {
        naga::TypeInner::Scalar(s) if is_f32(s) => Some(UniformType::Float),
        naga::TypeInner::Vector { size, scalar } if is_f32(scalar) => match size {
            naga::VectorSize::Bi => Some(UniformType::Vec2),
            naga::VectorSize::Tri => Some(UniformType::Vec3),
            naga::VectorSize::Quad => None,
        },
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if is_f32(scalar) => Some(UniformType::Mat4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_VS: &str = r#"
        struct VsOut {
            @builtin(position) pos: vec4<f32>,
            @location(0) uv: vec2<f32>,
        };

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> VsOut {
            var out: VsOut;
            out.pos = vec4<f32>(pos * 2.0 - 1.0, 0.0, 1.0);
            out.uv = pos;
            return out;
        }
    "#;

    const TINT_FS: &str = r#"
        struct Uniforms {
            tint: vec3<f32>,
            strength: f32,
        };
        @group(0) @binding(0) var<uniform> u: Uniforms;

        @fragment
        fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(u.tint * u.strength, 1.0);
        }
    "#;

    fn tint_defaults() -> Vec<(&'static str, UniformValue)> {
        vec![
            ("tint", UniformValue::Vec3([1.0, 0.0, 0.0])),
            ("strength", UniformValue::Float(0.5)),
        ]
    }

    // ── compile ───────────────────────────────────────────────────────────

    #[test]
    fn compiles_and_introspects_the_block() {
        let p = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &tint_defaults()).unwrap();
        let slots = p.layout().slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].name, "tint");
        assert_eq!(slots[0].ty, UniformType::Vec3);
        assert_eq!(slots[0].offset, 0);
        // f32 packs into the vec3's fourth component.
        assert_eq!(slots[1].offset, 12);
        assert_eq!(p.layout().byte_size(), 16);
    }

    #[test]
    fn bad_source_fails_with_diagnostic_log() {
        let err = ShaderProgram::compile("broken", "fn nope(", TINT_FS, &[]).unwrap_err();
        match err {
            EngineError::Compile { stage, log, .. } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected Compile, got {other:?}"),
        }
    }

    #[test]
    fn missing_default_fails_compile() {
        let defaults = [("tint", UniformValue::Vec3([0.0; 3]))];
        let err = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &defaults).unwrap_err();
        assert!(matches!(err, EngineError::Compile { .. }));
    }

    #[test]
    fn extra_default_is_unknown_uniform() {
        let mut defaults = tint_defaults();
        defaults.push(("bogus", UniformValue::Float(1.0)));
        let err = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &defaults).unwrap_err();
        assert!(matches!(err, EngineError::UnknownUniform { .. }));
    }

    #[test]
    fn wrongly_shaped_default_is_type_mismatch() {
        let defaults = [
            ("tint", UniformValue::Float(1.0)),
            ("strength", UniformValue::Float(0.5)),
        ];
        let err = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &defaults).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }

    // ── set_uniform ───────────────────────────────────────────────────────

    #[test]
    fn set_uniform_updates_and_dirties() {
        let mut p = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &tint_defaults()).unwrap();
        p.mark_clean();

        p.set_uniform("strength", UniformValue::Float(0.9)).unwrap();
        assert!(p.is_dirty());
        assert_eq!(p.uniform("strength"), Some(UniformValue::Float(0.9)));
    }

    #[test]
    fn setting_the_same_value_stays_clean() {
        let mut p = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &tint_defaults()).unwrap();
        p.mark_clean();
        p.set_uniform("strength", UniformValue::Float(0.5)).unwrap();
        assert!(!p.is_dirty());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut p = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &tint_defaults()).unwrap();
        let err = p.set_uniform("nope", UniformValue::Float(1.0)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownUniform { .. }));
    }

    #[test]
    fn wrong_shape_is_rejected_without_coercion() {
        let mut p = ShaderProgram::compile("tint", QUAD_VS, TINT_FS, &tint_defaults()).unwrap();
        let err = p
            .set_uniform("strength", UniformValue::Vec2([0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::TypeMismatch {
                expected: UniformType::Float,
                got: UniformType::Vec2,
                ..
            }
        ));
    }

    #[test]
    fn program_without_uniforms_is_valid() {
        const PLAIN_FS: &str = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;
        let p = ShaderProgram::compile("plain", QUAD_VS, PLAIN_FS, &[]).unwrap();
        assert!(p.layout().is_empty());
        assert_eq!(p.layout().byte_size(), 0);
    }
}
