/// Data that will be read only for the course of the program, containing everything needed to create shaders and pipelines
pub struct StateInstance {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,

    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub lighting_bind_group_layout: wgpu::BindGroupLayout,
    pub bones_bind_group_layout: wgpu::BindGroupLayout,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
}

impl StateInstance {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        // The floor pass reconstructs world positions per pixel, so camera and
        // light are visible to both stages.
        let camera_bind_group_layout = uniform_layout(
            &device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "camera_bind_group_layout",
        );
        let lighting_bind_group_layout = uniform_layout(
            &device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "lighting_bind_group_layout",
        );
        let bones_bind_group_layout =
            uniform_layout(&device, wgpu::ShaderStages::VERTEX, "bones_bind_group_layout");

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        // This should match the filterable field of the
                        // corresponding Texture entry above.
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        Self {
            device,
            queue,
            format,
            camera_bind_group_layout,
            lighting_bind_group_layout,
            bones_bind_group_layout,
            texture_bind_group_layout,
        }
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    visibility: wgpu::ShaderStages,
    label: &'static str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}
