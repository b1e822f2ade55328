use std::mem;

use wgpu::util::DeviceExt;

/// A uniform buffer together with the bind group exposing it at binding 0.
pub struct VBuffer {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl VBuffer {
    pub fn new<T: bytemuck::Pod>(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        value: T,
        label: &'static str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[value]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self::with_buffer(device, bind_group_layout, buffer, label)
    }

    pub fn new_zeroed<T: bytemuck::Pod>(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        label: &'static str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: &bytemuck::zeroed_slice_box::<u8>(mem::size_of::<T>()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self::with_buffer(device, bind_group_layout, buffer, label)
    }

    /// Queue a full overwrite of the buffer contents.
    ///
    /// The write lands before any command buffer submitted after this call,
    /// so per-frame constants must be written before the draws that read them
    /// are submitted.
    pub fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    fn with_buffer(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        buffer: wgpu::Buffer,
        label: &'static str,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });

        Self { buffer, bind_group }
    }
}
