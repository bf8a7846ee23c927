use glam::Vec3;

use crate::color::Color;

/// Uniform fill light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Point light with linear range falloff.
///
/// Colocated with the scan plane; its position is rewritten every frame to
/// match the sweep.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    pub position: Vec3,
}
