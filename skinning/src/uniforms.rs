//! Host-side layouts of the uniform blocks declared in the WGSL sources.

use crate::{
    bones::{Bone, MAX_BONES},
    camera::Camera,
};

// We need this for Rust to store our data correctly for the shaders
#[repr(C)]
// This is so we can store this in a buffer
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_inv: [[f32; 4]; 4],
    pub projection_inv: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            world: camera.world.to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            view_inv: camera.view_inverse().to_cols_array_2d(),
            projection_inv: camera.projection_inverse().to_cols_array_2d(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::from_camera(&Camera::default())
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
}

/// Bone pose as uploaded: translations padded to vec4 for the 16 byte array
/// stride of uniform buffers, rotations as (x, y, z, w).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoneUniform {
    pub translations: [[f32; 4]; MAX_BONES],
    pub rotations: [[f32; 4]; MAX_BONES],
}

impl BoneUniform {
    /// Slots past the uploaded bones hold the identity transform.
    pub fn from_bones(bones: &[Bone]) -> Self {
        let mut uniform = Self {
            translations: [[0.0; 4]; MAX_BONES],
            rotations: [[0.0, 0.0, 0.0, 1.0]; MAX_BONES],
        };
        for (i, bone) in bones.iter().take(MAX_BONES).enumerate() {
            uniform.translations[i] = bone.translation.extend(0.0).to_array();
            uniform.rotations[i] = bone.rotation.to_array();
        }
        uniform
    }
}

impl Default for BoneUniform {
    fn default() -> Self {
        Self::from_bones(&[])
    }
}
