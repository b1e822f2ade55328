use thiserror::Error;

use crate::{bones::MAX_BONES, passes::PassKind};

/// Configuration errors detected when a draw call is submitted.
///
/// The per-vertex and per-pixel stages never report errors; anything that
/// would make an invocation read undefined data is refused here instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("{count} bones exceed the limit of {}", MAX_BONES)]
    TooManyBones { count: usize },
    #[error("vertex {vertex} slot {slot} references bone {index}, only {bone_count} uploaded")]
    BoneIndexOutOfRange {
        vertex: usize,
        slot: usize,
        index: u32,
        bone_count: usize,
    },
    #[error("bone {index} was never uploaded, only {uploaded} bones")]
    BoneNotUploaded { index: u32, uploaded: usize },
    #[error("vertex {vertex} slot {slot} has bone channel {value}, which is not an index")]
    InvalidBoneChannel { vertex: usize, slot: usize, value: f32 },
    #[error("a skin binding holds at most 4 influences, got {count}")]
    TooManyInfluences { count: usize },
    #[error("{required} bones are referenced by the geometry, only {uploaded} uploaded")]
    MissingBones { required: usize, uploaded: usize },
    #[error("triangle {triangle} references vertex {index}, only {vertex_count} vertices")]
    TriangleIndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("index count {len} does not describe whole primitives")]
    IncompletePrimitive { len: usize },
    #[error("the {} pass needs a bound texture", .0.label())]
    MissingTexture(PassKind),
}
