use glam::{Vec2, Vec4};

use super::{PassKind, ShadingPass, VertexOutput};
use crate::vertex::ScreenVertex;

pub const SCRUBBER_BACKGROUND: Vec4 = Vec4::new(0.1, 0.1, 0.1, 1.0);
pub const SCRUBBER_MARKER_COLOR: Vec4 = Vec4::ONE;
/// Normalized heights of the fixed marker bands.
pub const SCRUBBER_MARKERS: [f32; 2] = [0.33, 0.67];
pub const SCRUBBER_MARKER_HALF_WIDTH: f32 = 0.005;

/// Static timeline background drawn straight in device coordinates.
pub struct ScrubberPass;

impl ShadingPass for ScrubberPass {
    type Vertex = ScreenVertex;
    /// Position remapped from [-1, 1] to [0, 1].
    type Varyings = Vec2;

    const KIND: PassKind = PassKind::Scrubber;

    fn vertex(&self, vertex: &ScreenVertex) -> VertexOutput<Vec2> {
        let position = Vec2::from(vertex.position);
        VertexOutput {
            clip_position: Vec4::new(position.x, position.y, 0.0, 1.0),
            varyings: (position + 1.0) / 2.0,
        }
    }

    fn fragment(&self, uv: &Vec2) -> Vec4 {
        let on_marker = SCRUBBER_MARKERS
            .iter()
            .any(|marker| (uv.y - marker).abs() < SCRUBBER_MARKER_HALF_WIDTH);
        if on_marker {
            SCRUBBER_MARKER_COLOR
        } else {
            SCRUBBER_BACKGROUND
        }
    }
}
