//! Shader program registry.
//!
//! A [`ShaderProgram`] is compiled once from a vertex/fragment WGSL pair plus
//! a set of uniform defaults, and is immutable afterwards except for its
//! uniform *values*. Compilation parses both sources with naga and
//! introspects the group(0) uniform block, so:
//! - a bad source fails construction with the full diagnostic log,
//! - every uniform the shader references is guaranteed present in the value
//!   mapping before the first draw,
//! - CPU-side byte packing uses the exact offsets the GPU sees.
//!
//! The GPU half ([`ProgramBinding`]) is created lazily on first draw and
//! uploads the packed block only when a value changed.

mod binding;
mod program;
mod uniform;

pub use binding::ProgramBinding;
pub use program::ShaderProgram;
pub use uniform::{UniformLayout, UniformSlot, UniformType, UniformValue};
