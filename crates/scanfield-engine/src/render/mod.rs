//! GPU rendering context types.
//!
//! Renderers receive a [`RenderCtx`] (device/queue + surface format +
//! physical size) and a [`RenderTarget`] (encoder + the view that ends up on
//! screen). Each renderer is responsible for its own GPU resources
//! (pipelines, buffers, intermediate targets).

mod blend;
mod ctx;
mod quad;

pub use blend::{additive_blend, alpha_blend};
pub use ctx::{RenderCtx, RenderTarget};
pub use quad::{QuadBuffers, QuadVertex, QUAD_INDICES, QUAD_VERTICES};
