//! CPU reference stages of every pass.
//!
//! Each pass pairs a per-vertex function with a per-pixel function, matching
//! the `vs_main` / `fs_main` entry points of its WGSL source. Invocations share
//! no state; `run_vertex_stage` runs them in parallel the way the GPU does.

mod floor;
mod highlight;
mod mesh;
mod scrubber;
mod skeleton;

use glam::Vec4;
use rayon::prelude::*;

pub use floor::{checker_color, checker_parity, light_falloff, FloorPass, DEFAULT_CHECKER_WIDTH};
pub use highlight::{HighlightPass, HIGHLIGHT_COLOR};
pub use mesh::{MeshVaryings, NormalPass, Texture2D, TexturePass};
pub use scrubber::{
    ScrubberPass, SCRUBBER_BACKGROUND, SCRUBBER_MARKERS, SCRUBBER_MARKER_COLOR,
    SCRUBBER_MARKER_HALF_WIDTH,
};
pub use skeleton::{SkeletonPass, SKELETON_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    /// Skinned mesh shaded with its world-space normal.
    Normal,
    /// Skinned mesh sampling a bound 2D texture.
    Texture,
    /// Bone segments, one bone per vertex.
    Skeleton,
    /// Undeformed selection overlay.
    Highlight,
    Floor,
    Scrubber,
}

impl PassKind {
    pub const ALL: [PassKind; 6] = [
        PassKind::Normal,
        PassKind::Texture,
        PassKind::Skeleton,
        PassKind::Highlight,
        PassKind::Floor,
        PassKind::Scrubber,
    ];

    /// Reads the bone transform store.
    pub fn is_skinned(self) -> bool {
        matches!(self, PassKind::Normal | PassKind::Texture | PassKind::Skeleton)
    }

    pub fn uses_texture(self) -> bool {
        self == PassKind::Texture
    }

    pub fn uses_camera(self) -> bool {
        self != PassKind::Scrubber
    }

    pub fn uses_light(self) -> bool {
        matches!(self, PassKind::Normal | PassKind::Texture | PassKind::Floor)
    }

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Normal => "normal",
            PassKind::Texture => "texture",
            PassKind::Skeleton => "skeleton",
            PassKind::Highlight => "highlight",
            PassKind::Floor => "floor",
            PassKind::Scrubber => "scrubber",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Result of one vertex invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput<V> {
    pub clip_position: Vec4,
    pub varyings: V,
}

pub trait ShadingPass: Sync {
    type Vertex: Sync;
    type Varyings: Send;

    const KIND: PassKind;

    fn vertex(&self, vertex: &Self::Vertex) -> VertexOutput<Self::Varyings>;

    /// Color of one fragment given its interpolated varyings. Alpha is always 1.
    fn fragment(&self, varyings: &Self::Varyings) -> Vec4;
}

pub fn run_vertex_stage<P: ShadingPass>(
    pass: &P,
    vertices: &[P::Vertex],
) -> Vec<VertexOutput<P::Varyings>> {
    vertices.par_iter().map(|v| pass.vertex(v)).collect()
}
