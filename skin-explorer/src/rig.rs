//! Two bent tubes, their skeletons and the scene furniture around them.

use common::vtexture::VTexture;
use glam::{vec3, Quat, Vec3};
use skinning::{
    bones::{Bone, BoneTransformStore},
    camera::Camera,
    geometry::{
        bone_segments, floor_quad, infinite_floor, scrubber_quad, skinned_tube, wire_box,
        MeshData, Tube,
    },
    light::Light,
    passes::PassKind,
    vertex::{BoneSegmentVertex, SkinnedVertex},
    DrawError,
};

use crate::{
    config::ViewerConfig,
    error::RenderError,
    state::{DrawCommand, Frame, Viewport},
    v::{VMesh, VRenderer},
};

/// Fraction of the frame height taken by the scrubber strip.
pub const SCRUBBER_FRACTION: f32 = 0.1;
pub const TEXTURE_SIZE: u32 = 8;

/// One tube per mesh pass, side by side, each with its own pair of bones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoRig {
    pub tube: Tube,
    pub spacing: f32,
}

impl Default for DemoRig {
    fn default() -> Self {
        Self {
            tube: Tube::default(),
            spacing: 1.5,
        }
    }
}

impl DemoRig {
    /// Model-space offset and first bone of tube `slot`.
    fn placement(&self, slot: u32) -> (Vec3, u32) {
        let x = if slot == 0 { -self.spacing } else { self.spacing };
        (vec3(x, 0.0, 0.0), slot * 2)
    }

    pub fn tube_mesh(&self, slot: u32) -> MeshData<SkinnedVertex> {
        let (offset, first_bone) = self.placement(slot);
        let mut mesh = skinned_tube(&self.tube);
        for v in &mut mesh.vertices {
            v.position = (v.position() + offset).to_array();
            for index in &mut v.skin_indices {
                *index += first_bone as f32;
            }
        }
        mesh
    }

    pub fn skeleton_mesh(&self) -> MeshData<BoneSegmentVertex> {
        let segments: Vec<_> = (0..2)
            .flat_map(|slot| {
                let (offset, first_bone) = self.placement(slot);
                self.tube
                    .bones()
                    .map(|(bone, start, end)| (bone + first_bone, start + offset, end + offset))
            })
            .collect();
        bone_segments(&segments)
    }

    /// Both tubes bent at their joints by `bend` radians about +Z.
    pub fn pose(&self, bend: f32) -> Result<BoneTransformStore, DrawError> {
        let mut bones = BoneTransformStore::new();
        for slot in 0..2 {
            let (offset, _) = self.placement(slot);
            bones.push(Bone::IDENTITY)?;
            bones.push(Bone::rotation_about(
                self.tube.joint() + offset,
                Quat::from_rotation_z(bend),
            ))?;
        }
        Ok(bones)
    }

    /// Bind-pose bounds of the tube shown by the texture pass.
    pub fn highlight_bounds(&self) -> (Vec3, Vec3) {
        let (offset, _) = self.placement(1);
        let r = self.tube.radius * 1.1;
        (
            offset + vec3(-r, 0.0, -r),
            offset + vec3(r, self.tube.length, r),
        )
    }
}

/// Colored stripes along the tube so the texture pass is recognizable.
pub fn stripe_texels(size: u32) -> Vec<u8> {
    let mut texels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for _ in 0..size {
            let texel = if y % 2 == 0 {
                [230, 120, 40, 255]
            } else {
                [40, 90, 200, 255]
            };
            texels.extend_from_slice(&texel);
        }
    }
    texels
}

/// Every mesh the demo draws, uploaded once.
pub struct DemoScene {
    pub rig: DemoRig,
    pub normal_tube: VMesh,
    pub texture_tube: VMesh,
    pub skeleton: VMesh,
    pub highlight: VMesh,
    pub floor: VMesh,
    pub scrubber: VMesh,
}

impl DemoScene {
    pub fn upload(renderer: &VRenderer, config: &ViewerConfig) -> Result<Self, RenderError> {
        let rig = DemoRig::default();
        let instance = renderer.instance();

        let texture = VTexture::from_rgba8(
            &instance.device,
            &instance.queue,
            TEXTURE_SIZE,
            TEXTURE_SIZE,
            &stripe_texels(TEXTURE_SIZE),
            "stripes",
        );
        let mut texture_tube = VMesh::skinned(&instance, &rig.tube_mesh(1))?;
        texture_tube.load_tex(&instance, &texture);

        let (min, max) = rig.highlight_bounds();
        let floor = match config.floor_extent {
            Some(extent) => floor_quad(config.floor_height, extent),
            None => infinite_floor(config.floor_height),
        };

        Ok(Self {
            normal_tube: VMesh::skinned(&instance, &rig.tube_mesh(0))?,
            texture_tube,
            skeleton: VMesh::bone_segments(&instance, &rig.skeleton_mesh())?,
            highlight: VMesh::highlight(&instance, &wire_box(min, max))?,
            floor: VMesh::floor(&instance, &floor)?,
            scrubber: VMesh::scrubber(&instance, &scrubber_quad())?,
            rig,
        })
    }

    pub fn mesh(&self, pass: PassKind) -> &VMesh {
        match pass {
            PassKind::Normal => &self.normal_tube,
            PassKind::Texture => &self.texture_tube,
            PassKind::Skeleton => &self.skeleton,
            PassKind::Highlight => &self.highlight,
            PassKind::Floor => &self.floor,
            PassKind::Scrubber => &self.scrubber,
        }
    }

    /// The configured passes, in order, over the posed rig.
    pub fn frame(&self, config: &ViewerConfig) -> Result<Frame<'_>, RenderError> {
        let camera = Camera::look_at(
            config.eye,
            config.target,
            Vec3::Y,
            config.aspect(),
            config.fovy.to_radians(),
            0.1,
            1000.0,
        );
        let bones = self.rig.pose(config.bend.to_radians())?;
        let mut frame = Frame::new(camera, Light::new(config.light), bones);

        for &pass in &config.passes {
            let mut command = DrawCommand::new(pass, self.mesh(pass));
            if pass == PassKind::Scrubber {
                command = command.with_viewport(Viewport::bottom_strip(
                    config.width,
                    config.height,
                    SCRUBBER_FRACTION,
                ));
            }
            frame.draw(command);
        }
        Ok(frame)
    }
}
