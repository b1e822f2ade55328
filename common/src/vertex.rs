/// A vertex type that can be bound as the single vertex buffer of a pipeline.
pub trait Vertex: bytemuck::Pod {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}
