use glam::{Vec3, Vec4, Vec4Swizzles};

use super::{PassKind, ShadingPass, VertexOutput};
use crate::{camera::Camera, light::Light, vertex::FloorVertex};

pub const DEFAULT_CHECKER_WIDTH: f32 = 5.0;

/// Which checker cell colour covers `world` on the XZ plane: 0 or 1.
pub fn checker_parity(world: Vec3, width: f32) -> u32 {
    let i = (world.x / width).floor();
    let j = (world.z / width).floor();
    (i + j).rem_euclid(2.0) as u32
}

/// Even cells are white, odd cells black.
pub fn checker_color(parity: u32) -> Vec3 {
    if parity % 2 == 0 {
        Vec3::ONE
    } else {
        Vec3::ZERO
    }
}

/// Lambert-style falloff against the up vector, in [0, 1].
pub fn light_falloff(light: &Light, world_position: Vec4) -> f32 {
    light
        .direction_from(world_position)
        .normalize()
        .dot(Vec4::Y)
        .clamp(0.0, 1.0)
}

/// Checkerboard ground plane lit by the shared point light.
pub struct FloorPass<'a> {
    pub camera: &'a Camera,
    pub light: &'a Light,
    pub checker_width: f32,
}

impl FloorPass<'_> {
    /// Un-project an interpolated clip position back to world space.
    pub fn world_position(&self, clip_position: Vec4) -> Vec4 {
        let ndc = clip_position.xyz() / clip_position.w;
        let world = self.camera.view_inverse() * self.camera.projection_inverse() * ndc.extend(1.0);
        world / world.w
    }
}

impl ShadingPass for FloorPass<'_> {
    type Vertex = FloorVertex;
    /// The clip position itself, carried to the fragment stage.
    type Varyings = Vec4;

    const KIND: PassKind = PassKind::Floor;

    fn vertex(&self, vertex: &FloorVertex) -> VertexOutput<Vec4> {
        let clip_position = self
            .camera
            .clip_position(self.camera.world * Vec4::from(vertex.position));
        VertexOutput {
            clip_position,
            varyings: clip_position,
        }
    }

    fn fragment(&self, clip_position: &Vec4) -> Vec4 {
        let world = self.world_position(*clip_position);
        let color = checker_color(checker_parity(world.xyz(), self.checker_width));
        let lit = (light_falloff(self.light, world) * color).clamp(Vec3::ZERO, Vec3::ONE);
        lit.extend(1.0)
    }
}
