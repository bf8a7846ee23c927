//! Typed error taxonomy for the renderer contract.
//!
//! Runtime plumbing (window/event-loop bootstrap) uses `anyhow`; the
//! renderer-facing operations return these typed errors so callers can tell
//! a bad shader from a missing GPU from a bad configuration.

use crate::program::UniformType;

/// Errors surfaced by renderer construction and per-frame uniform updates.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Shader source rejected at parse/validation time.
    ///
    /// `log` carries the full diagnostic emitted against the source, so the
    /// failing line is visible without re-running anything.
    #[error("shader '{label}' failed to compile ({stage}):\n{log}")]
    Compile {
        label: String,
        stage: ShaderStage,
        log: String,
    },

    /// A uniform name that was never declared at compile time.
    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },

    /// A uniform value whose shape disagrees with the declared type.
    ///
    /// No implicit coercion is performed.
    #[error("uniform '{name}' is declared {expected:?}, got {got:?}")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        got: UniformType,
    },

    /// The host environment cannot provide a GPU context.
    ///
    /// Callers should degrade to rendering nothing rather than crash.
    #[error("no usable GPU context: {0}")]
    ContextUnavailable(String),

    /// A resize observed zero dimensions (typically mid-teardown).
    ///
    /// Treated as a no-op by every resize path; surfaced only where a caller
    /// explicitly asks for the outcome.
    #[error("resize observed zero dimensions")]
    ResizeRace,

    /// A construction-time configuration value outside its documented range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Which shader stage a compile diagnostic belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}
