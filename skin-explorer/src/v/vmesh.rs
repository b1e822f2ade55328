use common::{vertex::Vertex, vinstance::StateInstance, vtexture::VTexture};
use skinning::{
    geometry::MeshData,
    passes::PassKind,
    validate::{
        check_lines, check_triangles, required_bones_segments, required_bones_skinned,
        weight_sum_outliers,
    },
    vertex::{BoneSegmentVertex, FloorVertex, PositionVertex, ScreenVertex, SkinnedVertex},
    DrawError,
};
use wgpu::util::DeviceExt;

/// Skin weights further than this from 1 are reported at upload.
pub const WEIGHT_TOLERANCE: f32 = 1e-3;

/// Which vertex layout a mesh was uploaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshLayout {
    Skinned,
    BoneSegments,
    Positions,
    Floor,
    Screen,
}

impl MeshLayout {
    pub fn for_pass(kind: PassKind) -> Self {
        match kind {
            PassKind::Normal | PassKind::Texture => MeshLayout::Skinned,
            PassKind::Skeleton => MeshLayout::BoneSegments,
            PassKind::Highlight => MeshLayout::Positions,
            PassKind::Floor => MeshLayout::Floor,
            PassKind::Scrubber => MeshLayout::Screen,
        }
    }
}

/// Geometry resident on the GPU, checked once at upload.
pub struct VMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    layout: MeshLayout,
    required_bones: usize,
    texture_bind_group: Option<wgpu::BindGroup>,
}

impl VMesh {
    fn new<V: Vertex>(
        device: &wgpu::Device,
        mesh: &MeshData<V>,
        layout: MeshLayout,
        required_bones: usize,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "Uploaded {layout:?} mesh: {} vertices, {} indices, {required_bones} bones",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        VMesh {
            vertex_buffer,
            index_buffer,
            num_indices: mesh.indices.len() as u32,
            layout,
            required_bones,
            texture_bind_group: None,
        }
    }

    /// Triangle mesh for the normal and texture passes.
    pub fn skinned(
        instance: &StateInstance,
        mesh: &MeshData<SkinnedVertex>,
    ) -> Result<Self, DrawError> {
        check_triangles(&mesh.indices, mesh.vertices.len())?;
        let required = required_bones_skinned(&mesh.vertices)?;
        weight_sum_outliers(&mesh.vertices, WEIGHT_TOLERANCE);
        Ok(Self::new(&instance.device, mesh, MeshLayout::Skinned, required))
    }

    /// Line list for the skeleton pass.
    pub fn bone_segments(
        instance: &StateInstance,
        mesh: &MeshData<BoneSegmentVertex>,
    ) -> Result<Self, DrawError> {
        check_lines(&mesh.indices, mesh.vertices.len())?;
        let required = required_bones_segments(&mesh.vertices)?;
        Ok(Self::new(
            &instance.device,
            mesh,
            MeshLayout::BoneSegments,
            required,
        ))
    }

    /// Line list for the highlight pass.
    pub fn highlight(
        instance: &StateInstance,
        mesh: &MeshData<PositionVertex>,
    ) -> Result<Self, DrawError> {
        check_lines(&mesh.indices, mesh.vertices.len())?;
        Ok(Self::new(&instance.device, mesh, MeshLayout::Positions, 0))
    }

    pub fn floor(instance: &StateInstance, mesh: &MeshData<FloorVertex>) -> Result<Self, DrawError> {
        check_triangles(&mesh.indices, mesh.vertices.len())?;
        Ok(Self::new(&instance.device, mesh, MeshLayout::Floor, 0))
    }

    pub fn scrubber(
        instance: &StateInstance,
        mesh: &MeshData<ScreenVertex>,
    ) -> Result<Self, DrawError> {
        check_triangles(&mesh.indices, mesh.vertices.len())?;
        Ok(Self::new(&instance.device, mesh, MeshLayout::Screen, 0))
    }

    /// Bind `texture` for the texture pass. Textures without a sampler leave
    /// the mesh unbound.
    pub fn load_tex(&mut self, instance: &StateInstance, texture: &VTexture) {
        self.texture_bind_group =
            texture.bind_group(&instance.device, &instance.texture_bind_group_layout);
    }

    pub fn layout(&self) -> MeshLayout {
        self.layout
    }
    pub fn required_bones(&self) -> usize {
        self.required_bones
    }
    pub fn has_texture(&self) -> bool {
        self.texture_bind_group.is_some()
    }
    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    /// Record the draw. The pipeline and shared bind groups must already be set.
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, texture_group: Option<u32>) {
        if self.num_indices == 0 {
            return;
        }
        if let (Some(group), Some(texture)) = (texture_group, &self.texture_bind_group) {
            render_pass.set_bind_group(group, texture, &[]);
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}
