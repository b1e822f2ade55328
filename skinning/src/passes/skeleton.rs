use glam::{Vec3, Vec4};

use super::{PassKind, ShadingPass, VertexOutput};
use crate::{
    bones::BoneTransformStore,
    camera::Camera,
    skin::{bone_index, skin_rigid},
    vertex::BoneSegmentVertex,
};

pub const SKELETON_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// Debug overlay of bone placement. Uses the same bone transform as the mesh
/// passes, without blending.
pub struct SkeletonPass<'a> {
    pub camera: &'a Camera,
    pub bones: &'a BoneTransformStore,
}

impl ShadingPass for SkeletonPass<'_> {
    type Vertex = BoneSegmentVertex;
    type Varyings = ();

    const KIND: PassKind = PassKind::Skeleton;

    fn vertex(&self, vertex: &BoneSegmentVertex) -> VertexOutput<()> {
        let posed = bone_index(vertex.bone_index).map_or(Vec3::ZERO, |bone| {
            skin_rigid(vertex.position(), bone, self.bones)
        });
        VertexOutput {
            clip_position: self.camera.clip_position(self.camera.world_position(posed)),
            varyings: (),
        }
    }

    fn fragment(&self, _: &()) -> Vec4 {
        SKELETON_COLOR
    }
}
