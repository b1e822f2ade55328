//! Checks run once per upload or per draw submission, outside the parallel
//! stages. A draw that fails any of them is refused instead of recorded.

use rayon::prelude::*;

use crate::{
    bones::{BoneTransformStore, MAX_BONES},
    error::DrawError,
    passes::PassKind,
    skin::bone_index,
    vertex::{BoneSegmentVertex, SkinnedVertex},
};

fn decode(vertex: usize, slot: usize, channel: f32) -> Result<u32, DrawError> {
    let index = bone_index(channel).ok_or(DrawError::InvalidBoneChannel {
        vertex,
        slot,
        value: channel,
    })?;
    if index as usize >= MAX_BONES {
        return Err(DrawError::BoneIndexOutOfRange {
            vertex,
            slot,
            index,
            bone_count: MAX_BONES,
        });
    }
    Ok(index)
}

/// Number of bones a skinned mesh needs uploaded, decoded from its index
/// channels.
///
/// Zero-weight slots count too: the vertex stage reads every slot.
pub fn required_bones_skinned(vertices: &[SkinnedVertex]) -> Result<usize, DrawError> {
    let mut required = 0;
    for (vertex, v) in vertices.iter().enumerate() {
        for (slot, &channel) in v.skin_indices.iter().enumerate() {
            let index = decode(vertex, slot, channel)?;
            required = required.max(index as usize + 1);
        }
    }
    Ok(required)
}

pub fn required_bones_segments(vertices: &[BoneSegmentVertex]) -> Result<usize, DrawError> {
    let mut required = 0;
    for (vertex, v) in vertices.iter().enumerate() {
        let index = decode(vertex, 0, v.bone_index)?;
        required = required.max(index as usize + 1);
    }
    Ok(required)
}

pub fn check_bone_count(required: usize, bones: &BoneTransformStore) -> Result<(), DrawError> {
    if required > bones.len() {
        Err(DrawError::MissingBones {
            required,
            uploaded: bones.len(),
        })
    } else {
        Ok(())
    }
}

fn check_primitives(indices: &[u32], vertex_count: usize, arity: usize) -> Result<(), DrawError> {
    if indices.len() % arity != 0 {
        return Err(DrawError::IncompletePrimitive { len: indices.len() });
    }
    match indices
        .iter()
        .position(|&index| index as usize >= vertex_count)
    {
        Some(at) => Err(DrawError::TriangleIndexOutOfRange {
            triangle: at / arity,
            index: indices[at],
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Every index must name an existing vertex and the list must hold whole
/// triangles.
pub fn check_triangles(indices: &[u32], vertex_count: usize) -> Result<(), DrawError> {
    check_primitives(indices, vertex_count, 3)
}

pub fn check_lines(indices: &[u32], vertex_count: usize) -> Result<(), DrawError> {
    check_primitives(indices, vertex_count, 2)
}

pub fn check_texture(pass: PassKind, bound: bool) -> Result<(), DrawError> {
    if pass.uses_texture() && !bound {
        Err(DrawError::MissingTexture(pass))
    } else {
        Ok(())
    }
}

/// Count vertices whose weights do not sum to one within `tolerance`.
///
/// The weights are left as they are; a non-zero count is only logged.
pub fn weight_sum_outliers(vertices: &[SkinnedVertex], tolerance: f32) -> usize {
    let outliers = vertices
        .par_iter()
        .filter(|v| (v.binding().weight_sum() - 1.0).abs() > tolerance)
        .count();
    if outliers > 0 {
        log::warn!(
            "{outliers} of {} vertices have skin weights not summing to 1",
            vertices.len()
        );
    }
    outliers
}
