use std::{collections::HashMap, sync::Arc};

use common::prelude::{DepthMode, StateInstance, VBuffer, VShader, VTexture};
use skinning::{
    passes::PassKind,
    shader::{create_shader_module, ShaderConstants},
    uniforms::{BoneUniform, CameraUniform, LightUniform},
    validate::{check_bone_count, check_texture},
    vertex::{BoneSegmentVertex, FloorVertex, PositionVertex, ScreenVertex, SkinnedVertex},
};

use super::vmesh::MeshLayout;
use crate::{
    error::RenderError,
    state::{Frame, Viewport},
};

/// Bind group the texture pass samples from, after camera, light and bones.
const TEXTURE_GROUP: u32 = 3;
const SHARED_GROUPS: u32 = 3;

/// Offscreen renderer drawing every pass into one RGBA8 target.
pub struct VRenderer {
    instance: Arc<StateInstance>,
    width: u32,
    height: u32,
    color_target: VTexture,
    depth_texture: VTexture,
    camera_buffer: VBuffer,
    light_buffer: VBuffer,
    bones_buffer: VBuffer,
    pipelines: HashMap<PassKind, VShader>,
}

fn create_pipeline(
    instance: &StateInstance,
    kind: PassKind,
    constants: &ShaderConstants,
) -> VShader {
    let shader = create_shader_module(&instance.device, kind, constants);
    let camera = &instance.camera_bind_group_layout;
    let light = &instance.lighting_bind_group_layout;
    let bones = &instance.bones_bind_group_layout;
    let texture = &instance.texture_bind_group_layout;
    let name = kind.label();

    use wgpu::PrimitiveTopology::{LineList, TriangleList};
    match kind {
        PassKind::Normal => VShader::new::<SkinnedVertex>(
            instance,
            shader,
            &[camera, light, bones],
            TriangleList,
            Some(wgpu::Face::Back),
            DepthMode::Test,
            name,
        ),
        PassKind::Texture => VShader::new::<SkinnedVertex>(
            instance,
            shader,
            &[camera, light, bones, texture],
            TriangleList,
            Some(wgpu::Face::Back),
            DepthMode::Test,
            name,
        ),
        // Group 1 is declared but unused so bones stay at group 2.
        PassKind::Skeleton => VShader::new::<BoneSegmentVertex>(
            instance,
            shader,
            &[camera, light, bones],
            LineList,
            None,
            DepthMode::Ignore,
            name,
        ),
        PassKind::Highlight => VShader::new::<PositionVertex>(
            instance,
            shader,
            &[camera],
            LineList,
            None,
            DepthMode::Overlay,
            name,
        ),
        PassKind::Floor => VShader::new::<FloorVertex>(
            instance,
            shader,
            &[camera, light],
            TriangleList,
            None,
            DepthMode::Test,
            name,
        ),
        PassKind::Scrubber => VShader::new::<ScreenVertex>(
            instance,
            shader,
            &[],
            TriangleList,
            None,
            DepthMode::Ignore,
            name,
        ),
    }
}

impl VRenderer {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Open a device without a surface and build every pipeline.
    pub async fn new_headless(
        width: u32,
        height: u32,
        constants: &ShaderConstants,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        log::info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None, // Trace path
            )
            .await?;

        Ok(Self::from_device(device, queue, width, height, constants))
    }

    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        width: u32,
        height: u32,
        constants: &ShaderConstants,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let instance = StateInstance::new(device, queue, Self::COLOR_FORMAT);

        let color_target = VTexture::create_color_target(
            &instance.device,
            width,
            height,
            Self::COLOR_FORMAT,
            "color_target",
        );
        let depth_texture =
            VTexture::create_depth_texture(&instance.device, width, height, "depth_texture");

        let camera_buffer = VBuffer::new(
            &instance.device,
            &instance.camera_bind_group_layout,
            CameraUniform::default(),
            "Camera Buffer",
        );
        let light_buffer = VBuffer::new_zeroed::<LightUniform>(
            &instance.device,
            &instance.lighting_bind_group_layout,
            "Light Buffer",
        );
        let bones_buffer = VBuffer::new(
            &instance.device,
            &instance.bones_bind_group_layout,
            BoneUniform::default(),
            "Bones Buffer",
        );

        let pipelines = PassKind::ALL
            .into_iter()
            .map(|kind| (kind, create_pipeline(&instance, kind, constants)))
            .collect();

        log::info!("Headless renderer ready at {width}x{height}");

        Self {
            instance: Arc::new(instance),
            width,
            height,
            color_target,
            depth_texture,
            camera_buffer,
            light_buffer,
            bones_buffer,
            pipelines,
        }
    }

    pub fn instance(&self) -> Arc<StateInstance> {
        self.instance.clone()
    }
    pub fn device(&self) -> &wgpu::Device {
        &self.instance.device
    }
    pub fn queue(&self) -> &wgpu::Queue {
        &self.instance.queue
    }
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check every draw of `frame` against what its pass reads.
    pub fn validate(&self, frame: &Frame) -> Result<(), RenderError> {
        for draw in &frame.draws {
            let layout = draw.mesh.layout();
            if layout != MeshLayout::for_pass(draw.pass) {
                return Err(RenderError::LayoutMismatch {
                    pass: draw.pass,
                    layout,
                });
            }
            if !self.pipelines.contains_key(&draw.pass) {
                return Err(RenderError::MissingPipeline(draw.pass));
            }
            if draw.pass.is_skinned() {
                check_bone_count(draw.mesh.required_bones(), &frame.bones)?;
            }
            check_texture(draw.pass, draw.mesh.has_texture())?;
        }
        Ok(())
    }

    /// Validate, upload the frame constants, then record and submit every draw.
    ///
    /// Nothing is written or submitted if any draw is refused.
    pub fn render(&self, frame: &Frame) -> Result<(), RenderError> {
        self.validate(frame)?;

        self.camera_buffer
            .write(self.queue(), &frame.camera.to_uniform());
        self.light_buffer.write(self.queue(), &frame.light.to_uniform());
        self.bones_buffer.write(self.queue(), &frame.bones.to_uniform());

        let mut encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.color_target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let shared = [
                &self.camera_buffer.bind_group,
                &self.light_buffer.bind_group,
                &self.bones_buffer.bind_group,
            ];

            for draw in &frame.draws {
                let shader = self
                    .pipelines
                    .get(&draw.pass)
                    .ok_or(RenderError::MissingPipeline(draw.pass))?;

                let viewport = draw
                    .viewport
                    .unwrap_or_else(|| Viewport::full(self.width, self.height));
                render_pass.set_viewport(
                    viewport.x,
                    viewport.y,
                    viewport.width,
                    viewport.height,
                    0.0,
                    1.0,
                );

                shader.draw(&mut render_pass);
                let groups = shader.bind_groups().min(SHARED_GROUPS) as usize;
                for (i, bind_group) in shared.into_iter().take(groups).enumerate() {
                    render_pass.set_bind_group(i as u32, bind_group, &[]);
                }

                let texture_group = draw.pass.uses_texture().then_some(TEXTURE_GROUP);
                draw.mesh.draw(&mut render_pass, texture_group);

                log::debug!(
                    "Drew {} pass, {} indices",
                    draw.pass.label(),
                    draw.mesh.num_indices()
                );
            }
        }

        self.queue().submit(std::iter::once(encoder.finish()));
        log::info!(
            "Rendered frame: {} draws, {} bones",
            frame.draws.len(),
            frame.bones.len()
        );
        Ok(())
    }

    /// Copy the color target back to the host as tightly packed RGBA8 rows.
    pub fn read_color(&self) -> Result<Vec<u8>, RenderError> {
        let unpadded = self.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: padded as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: self.color_target.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            self.color_target.size(),
        );
        self.queue().submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device().poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        buffer.unmap();

        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3, Quat, Vec3};
    use skinning::{
        bones::{Bone, BoneTransformStore},
        camera::Camera,
        geometry::{bone_segments, scrubber_quad, skinned_tube, MeshData, Tube},
        light::Light,
        skin::{skin, SkinBinding},
        vertex::{PositionVertex, SkinnedVertex},
        DrawError,
    };

    use super::*;
    use crate::{
        config::ViewerConfig,
        rig::DemoScene,
        state::DrawCommand,
        v::VMesh,
    };

    /// `None` on machines without any adapter, so GPU tests skip there.
    fn renderer(width: u32, height: u32) -> Option<VRenderer> {
        match pollster::block_on(VRenderer::new_headless(
            width,
            height,
            &ShaderConstants::default(),
        )) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                eprintln!("skipping GPU test: {e}");
                None
            }
        }
    }

    fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    fn empty_frame<'a>(bones: usize) -> Frame<'a> {
        Frame::new(
            Camera::default(),
            Light::default(),
            BoneTransformStore::identity(bones).unwrap(),
        )
    }

    fn render_single(
        renderer: &VRenderer,
        camera: Camera,
        bones: BoneTransformStore,
        pass: PassKind,
        mesh: &VMesh,
    ) -> Vec<u8> {
        let mut frame = Frame::new(camera, Light::default(), bones);
        frame.draw(DrawCommand::new(pass, mesh));
        renderer.render(&frame).unwrap();
        renderer.read_color().unwrap()
    }

    fn posed_bones() -> BoneTransformStore {
        BoneTransformStore::from_bones([
            Bone::new(vec3(0.2, 0.0, 0.0), Quat::from_rotation_z(0.6)),
            Bone::new(
                vec3(0.0, 0.3, 0.0),
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ),
        ])
        .unwrap()
    }

    fn front_camera(width: u32, height: u32) -> Camera {
        Camera::look_at(
            vec3(0.0, 0.0, 4.0),
            Vec3::ZERO,
            Vec3::Y,
            width as f32 / height as f32,
            60f32.to_radians(),
            0.1,
            100.0,
        )
    }

    /// Pixels whose channels differ by more than one step.
    fn differing(a: &[u8], b: &[u8]) -> usize {
        a.chunks(4)
            .zip(b.chunks(4))
            .filter(|(p, q)| p.iter().zip(q.iter()).any(|(x, y)| x.abs_diff(*y) > 1))
            .count()
    }

    #[test]
    fn gpu_blend_matches_cpu_skin() {
        let (width, height) = (64, 64);
        let Some(renderer) = renderer(width, height) else {
            return;
        };
        let instance = renderer.instance();
        let bones = posed_bones();
        let blended = |position: Vec3, root: f32| {
            SkinnedVertex::new(
                position,
                Vec3::Z,
                [0.0, 0.0],
                SkinBinding {
                    indices: [0.0, 1.0, 0.0, 0.0],
                    weights: [root, 1.0 - root, 0.0, 0.0],
                },
            )
        };
        let bind = MeshData::new(
            vec![
                blended(vec3(-1.5, -1.0, 0.0), 0.3),
                blended(vec3(1.5, -1.0, 0.0), 0.7),
                blended(vec3(0.0, 1.5, 0.0), 0.5),
            ],
            vec![0, 1, 2],
        );
        let preskinned = MeshData::new(
            bind.vertices
                .iter()
                .map(|v| {
                    SkinnedVertex::new(
                        skin(v.position(), &v.binding(), &bones),
                        v.normal(),
                        v.uv,
                        SkinBinding::rigid(0),
                    )
                })
                .collect(),
            bind.indices.clone(),
        );

        let camera = front_camera(width, height);
        let gpu = render_single(
            &renderer,
            camera,
            bones.clone(),
            PassKind::Normal,
            &VMesh::skinned(&instance, &bind).unwrap(),
        );
        let cpu = render_single(
            &renderer,
            camera,
            BoneTransformStore::identity(1).unwrap(),
            PassKind::Normal,
            &VMesh::skinned(&instance, &preskinned).unwrap(),
        );

        let facing = [128, 128, 255, 255];
        let covered = |pixels: &[u8]| {
            pixels
                .chunks(4)
                .filter(|p| p.iter().zip(facing).all(|(c, f)| c.abs_diff(f) <= 1))
                .count()
        };
        assert!(covered(&cpu) > 100, "triangle left the view");
        // Rounding may move a pixel on the edge, never the interior.
        assert!(covered(&gpu).abs_diff(covered(&cpu)) <= 2);
        assert!(differing(&gpu, &cpu) <= 2);
    }

    #[test]
    fn skeleton_lines_match_cpu_posed_highlight() {
        let (width, height) = (64, 64);
        let Some(renderer) = renderer(width, height) else {
            return;
        };
        let instance = renderer.instance();
        let bones = posed_bones();
        let segments = [
            (0, Vec3::ZERO, vec3(0.0, 1.2, 0.0)),
            (1, vec3(0.5, -1.0, 0.0), vec3(1.0, 0.5, 0.5)),
        ];
        let skeleton = bone_segments(&segments);
        let mut posed = MeshData::default();
        for (bone, start, end) in segments {
            let bone = bones.get(bone).unwrap();
            let base = posed.vertices.len() as u32;
            posed.vertices.push(PositionVertex::new(bone.apply(start)));
            posed.vertices.push(PositionVertex::new(bone.apply(end)));
            posed.indices.extend([base, base + 1]);
        }

        let camera = front_camera(width, height);
        let gpu = render_single(
            &renderer,
            camera,
            bones.clone(),
            PassKind::Skeleton,
            &VMesh::bone_segments(&instance, &skeleton).unwrap(),
        );
        let cpu = render_single(
            &renderer,
            camera,
            BoneTransformStore::new(),
            PassKind::Highlight,
            &VMesh::highlight(&instance, &posed).unwrap(),
        );

        let mask = |pixels: &[u8], color: [u8; 4]| -> Vec<bool> {
            pixels.chunks(4).map(|p| p == color).collect()
        };
        let red = mask(&gpu, [255, 0, 0, 255]);
        let yellow = mask(&cpu, [255, 255, 0, 255]);
        assert!(yellow.iter().filter(|&&on| on).count() > 20, "lines left the view");
        let mismatched = red.iter().zip(&yellow).filter(|(r, y)| r != y).count();
        assert!(mismatched <= 2, "{mismatched} line pixels differ");
    }

    #[test]
    fn refuses_invalid_draws_before_recording() {
        let Some(renderer) = renderer(16, 16) else {
            return;
        };
        let instance = renderer.instance();
        let tube = VMesh::skinned(&instance, &skinned_tube(&Tube::default())).unwrap();
        let screen = VMesh::scrubber(&instance, &scrubber_quad()).unwrap();

        let mut frame = empty_frame(1);
        frame.draw(DrawCommand::new(PassKind::Normal, &tube));
        assert!(matches!(
            renderer.render(&frame),
            Err(RenderError::Draw(DrawError::MissingBones {
                required: 2,
                uploaded: 1
            }))
        ));

        let mut frame = empty_frame(2);
        frame.draw(DrawCommand::new(PassKind::Texture, &tube));
        assert!(matches!(
            renderer.render(&frame),
            Err(RenderError::Draw(DrawError::MissingTexture(PassKind::Texture)))
        ));

        let mut frame = empty_frame(2);
        frame.draw(DrawCommand::new(PassKind::Floor, &screen));
        assert!(matches!(
            renderer.render(&frame),
            Err(RenderError::LayoutMismatch {
                pass: PassKind::Floor,
                layout: MeshLayout::Screen
            })
        ));
    }

    #[test]
    fn scrubber_draws_markers() {
        let (width, height) = (4, 1000);
        let Some(renderer) = renderer(width, height) else {
            return;
        };
        let screen = VMesh::scrubber(&renderer.instance(), &scrubber_quad()).unwrap();
        let mut frame = empty_frame(0);
        frame.draw(DrawCommand::new(PassKind::Scrubber, &screen));
        renderer.render(&frame).unwrap();

        let pixels = renderer.read_color().unwrap();
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        // uv.y = 0.33 and 0.67 sit at rows 670 and 330 counted from the top.
        assert_eq!(pixel(&pixels, width, 1, 670), [255, 255, 255, 255]);
        assert_eq!(pixel(&pixels, width, 1, 330), [255, 255, 255, 255]);
        let background = pixel(&pixels, width, 1, 500);
        assert!(background[..3].iter().all(|&c| c.abs_diff(26) <= 1));
        assert_eq!(background[3], 255);
    }

    #[test]
    fn demo_frame_shows_skeleton_and_highlight() {
        let config = ViewerConfig {
            width: 160,
            height: 120,
            ..ViewerConfig::default()
        };
        let Some(renderer) = renderer(config.width, config.height) else {
            return;
        };
        let scene = DemoScene::upload(&renderer, &config).unwrap();
        let frame = scene.frame(&config).unwrap();
        renderer.render(&frame).unwrap();

        let pixels = renderer.read_color().unwrap();
        let has = |color: [u8; 4]| pixels.chunks(4).any(|p| p == color);
        assert!(has([255, 0, 0, 255]), "no skeleton pixels");
        assert!(has([255, 255, 0, 255]), "no highlight pixels");
    }
}
