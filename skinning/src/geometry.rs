//! Procedural geometry for the passes that do not come from an asset.

use std::f32::consts::TAU;

use glam::{vec3, Vec3};

use crate::{
    skin::SkinBinding,
    vertex::{BoneSegmentVertex, FloorVertex, PositionVertex, ScreenVertex, SkinnedVertex},
};

/// Vertices plus a `u32` index list. Triangles or line pairs depending on
/// the pass that draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> Default for MeshData<V> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V> MeshData<V> {
    pub fn new(vertices: Vec<V>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append `other`, rebasing its indices.
    pub fn extend(&mut self, other: MeshData<V>) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// Square on the plane `y = height`, facing +Y.
pub fn floor_quad(height: f32, extent: f32) -> MeshData<FloorVertex> {
    let corners = [
        vec3(-extent, height, -extent),
        vec3(-extent, height, extent),
        vec3(extent, height, extent),
        vec3(extent, height, -extent),
    ];
    MeshData::new(
        corners
            .into_iter()
            .map(|c| FloorVertex::new(c.extend(1.0)))
            .collect(),
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Ground plane at `y = height` reaching the horizon: a fan around the origin
/// whose outer vertices are directions (w = 0) along the plane.
pub fn infinite_floor(height: f32) -> MeshData<FloorVertex> {
    let centre = FloorVertex::new(vec3(0.0, height, 0.0).extend(1.0));
    let horizon = [Vec3::Z, Vec3::X, Vec3::NEG_Z, Vec3::NEG_X]
        .into_iter()
        .map(|d| FloorVertex::new(d.extend(0.0)));
    MeshData::new(
        std::iter::once(centre).chain(horizon).collect(),
        vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1],
    )
}

/// Quad covering the whole viewport it is drawn into.
pub fn scrubber_quad() -> MeshData<ScreenVertex> {
    MeshData::new(
        vec![
            ScreenVertex::new(-1.0, -1.0),
            ScreenVertex::new(1.0, -1.0),
            ScreenVertex::new(1.0, 1.0),
            ScreenVertex::new(-1.0, 1.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// One line per bone, from `start` to `end` in bind pose.
pub fn bone_segments(bones: &[(u32, Vec3, Vec3)]) -> MeshData<BoneSegmentVertex> {
    let mut mesh = MeshData::default();
    for &(bone, start, end) in bones {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.push(BoneSegmentVertex::new(start, bone));
        mesh.vertices.push(BoneSegmentVertex::new(end, bone));
        mesh.indices.extend([base, base + 1]);
    }
    mesh
}

/// Line-list outline of an axis aligned box.
pub fn wire_box(min: Vec3, max: Vec3) -> MeshData<PositionVertex> {
    MeshData::new(
        [
            vec3(min.x, min.y, min.z),
            vec3(max.x, min.y, min.z),
            vec3(min.x, max.y, min.z),
            vec3(max.x, max.y, min.z),
            vec3(min.x, min.y, max.z),
            vec3(max.x, min.y, max.z),
            vec3(min.x, max.y, max.z),
            vec3(max.x, max.y, max.z),
        ]
        .into_iter()
        .map(PositionVertex::new)
        .collect(),
        vec![
            0, 1, 1, 3, 3, 2, 2, 0, 4, 5, 5, 7, 7, 6, 6, 4, 0, 4, 1, 5, 2, 6, 3, 7,
        ],
    )
}

/// Cylinder along +Y from the origin, skinned to two bones that meet at
/// half its length.
///
/// Positions are in model space; bone 0 owns the base, bone 1 the tip and the
/// middle half blends linearly between them. A pose where both bones are the
/// identity reproduces the bind pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tube {
    pub radius: f32,
    pub length: f32,
    /// Rings along the length, at least 1.
    pub rings: u32,
    /// Vertices around each ring, at least 3.
    pub segments: u32,
}

impl Default for Tube {
    fn default() -> Self {
        Self {
            radius: 0.5,
            length: 4.0,
            rings: 16,
            segments: 16,
        }
    }
}

impl Tube {
    pub fn joint(&self) -> Vec3 {
        vec3(0.0, self.length / 2.0, 0.0)
    }

    /// Blend weight of the tip bone at height `y`.
    ///
    /// A tube without length is bound to the root bone alone.
    pub fn tip_weight(&self, y: f32) -> f32 {
        if self.length.is_nan() || self.length <= 0.0 {
            return 0.0;
        }
        ((y / self.length - 0.25) / 0.5).clamp(0.0, 1.0)
    }

    /// Bone segments of the two-bone rig, for the skeleton pass.
    pub fn bones(&self) -> [(u32, Vec3, Vec3); 2] {
        [
            (0, Vec3::ZERO, self.joint()),
            (1, self.joint(), vec3(0.0, self.length, 0.0)),
        ]
    }
}

pub fn skinned_tube(tube: &Tube) -> MeshData<SkinnedVertex> {
    let rings = tube.rings.max(1);
    let segments = tube.segments.max(3);
    let columns = segments + 1;

    let mut vertices = Vec::with_capacity(((rings + 1) * columns) as usize);
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let y = v * tube.length;
        let tip = tube.tip_weight(y);
        let binding = SkinBinding {
            indices: [0.0, 1.0, 0.0, 0.0],
            weights: [1.0 - tip, tip, 0.0, 0.0],
        };
        for column in 0..columns {
            let u = column as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = vec3(cos, 0.0, sin);
            vertices.push(SkinnedVertex::new(
                vec3(tube.radius * cos, y, tube.radius * sin),
                normal,
                [u, v],
                binding,
            ));
        }
    }

    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for column in 0..segments {
            let a = ring * columns + column;
            let b = a + 1;
            let c = a + columns;
            let d = c + 1;
            // Counter-clockwise seen from outside.
            indices.extend([a, c, b, b, c, d]);
        }
    }

    MeshData::new(vertices, indices)
}
