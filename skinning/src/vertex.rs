use common::vertex::Vertex;
use glam::{Vec2, Vec3, Vec4};

use crate::skin::SkinBinding;

/// Bind-pose mesh vertex for the normal and texture passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub skin_indices: [f32; 4],
    pub skin_weights: [f32; 4],
}

impl SkinnedVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2], binding: SkinBinding) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
            skin_indices: binding.indices,
            skin_weights: binding.weights,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }
    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.uv)
    }
    pub fn binding(&self) -> SkinBinding {
        SkinBinding {
            indices: self.skin_indices,
            weights: self.skin_weights,
        }
    }
}

impl Vertex for SkinnedVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x4,
            4 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Endpoint of a bone segment, rigidly attached to one bone.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoneSegmentVertex {
    pub position: [f32; 3],
    pub bone_index: f32,
}

impl BoneSegmentVertex {
    pub fn new(position: Vec3, bone: u32) -> Self {
        Self {
            position: position.to_array(),
            bone_index: bone as f32,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

impl Vertex for BoneSegmentVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
        }
    }
}

impl Vertex for PositionVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Floor vertex, already homogeneous.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FloorVertex {
    pub position: [f32; 4],
}

impl FloorVertex {
    pub fn new(position: Vec4) -> Self {
        Self {
            position: position.to_array(),
        }
    }
}

impl Vertex for FloorVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Position in normalized device coordinates, no projection applied.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

impl Vertex for ScreenVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(SkinnedVertex::desc().array_stride, 64);
        assert_eq!(BoneSegmentVertex::desc().array_stride, 16);
        assert_eq!(PositionVertex::desc().array_stride, 12);
        assert_eq!(FloorVertex::desc().array_stride, 16);
        assert_eq!(ScreenVertex::desc().array_stride, 8);

        let offsets: Vec<_> = SkinnedVertex::desc()
            .attributes
            .iter()
            .map(|a| a.offset)
            .collect();
        assert_eq!(offsets, [0, 12, 24, 32, 48]);
    }
}
