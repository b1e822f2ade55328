use glam::{Vec3, Vec4};

use super::{PassKind, ShadingPass, VertexOutput};
use crate::{camera::Camera, vertex::PositionVertex};

pub const HIGHLIGHT_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);

/// Flat overlay of an externally selected subset. No skinning.
pub struct HighlightPass<'a> {
    pub camera: &'a Camera,
}

impl ShadingPass for HighlightPass<'_> {
    type Vertex = PositionVertex;
    type Varyings = ();

    const KIND: PassKind = PassKind::Highlight;

    fn vertex(&self, vertex: &PositionVertex) -> VertexOutput<()> {
        let world_position = self.camera.world_position(Vec3::from(vertex.position));
        VertexOutput {
            clip_position: self.camera.clip_position(world_position),
            varyings: (),
        }
    }

    fn fragment(&self, _: &()) -> Vec4 {
        HIGHLIGHT_COLOR
    }
}
