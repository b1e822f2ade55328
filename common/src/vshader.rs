use crate::{vertex::Vertex, vinstance::StateInstance, vtexture::VTexture};

/// How a pipeline participates in the shared depth attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// Standard depth test and write.
    Test,
    /// Depth tested against existing geometry, equal depth passes.
    Overlay,
    /// Ignores and never writes depth, for screen-space passes.
    Ignore,
}

impl DepthMode {
    fn state(self) -> wgpu::DepthStencilState {
        let (depth_write_enabled, depth_compare) = match self {
            DepthMode::Test => (true, wgpu::CompareFunction::Less),
            DepthMode::Overlay => (true, wgpu::CompareFunction::LessEqual),
            DepthMode::Ignore => (false, wgpu::CompareFunction::Always),
        };
        wgpu::DepthStencilState {
            format: VTexture::DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

pub struct VShader {
    render_pipeline: wgpu::RenderPipeline,
    bind_groups: u32,
}

impl VShader {
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.render_pipeline);
    }

    /// Number of bind groups the pipeline layout expects, starting at group 0.
    pub fn bind_groups(&self) -> u32 {
        self.bind_groups
    }

    pub fn new<V: Vertex>(
        instance: &StateInstance,
        shader: wgpu::ShaderModule,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        topology: wgpu::PrimitiveTopology,
        cull_mode: Option<wgpu::Face>,
        depth: DepthMode,
        name: &str,
    ) -> Self {
        let render_pipeline_layout =
            instance
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(name),
                    bind_group_layouts,
                    push_constant_ranges: &[],
                });

        log::info!(
            "Creating pipeline {name} with {} bind groups",
            bind_group_layouts.len()
        );

        let render_pipeline =
            instance
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(name),
                    layout: Some(&render_pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: "vs_main",
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                        buffers: &[<V>::desc()],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: "fs_main",
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: instance.format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        // Setting this to anything other than Fill requires Features::NON_FILL_POLYGON_MODE
                        polygon_mode: wgpu::PolygonMode::Fill,
                        // Requires Features::DEPTH_CLIP_CONTROL
                        unclipped_depth: false,
                        // Requires Features::CONSERVATIVE_RASTERIZATION
                        conservative: false,
                    },
                    depth_stencil: Some(depth.state()),
                    multisample: wgpu::MultisampleState {
                        count: 1,
                        mask: !0,
                        alpha_to_coverage_enabled: false,
                    },
                    multiview: None,
                });
        Self {
            render_pipeline,
            bind_groups: bind_group_layouts.len() as u32,
        }
    }
}
