use glam::{Vec2, Vec4};

use super::{PassKind, ShadingPass, VertexOutput};
use crate::{
    bones::BoneTransformStore, camera::Camera, light::Light, skin::skin, vertex::SkinnedVertex,
};

/// Outputs of the skinned mesh vertex stage, shared by both mesh passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVaryings {
    pub world_position: Vec4,
    /// `light.position - world_position`, left unnormalized.
    pub light_dir: Vec4,
    pub uv: Vec2,
    /// Bind-pose normal rotated by the world matrix only, never re-skinned.
    pub normal: Vec4,
}

fn mesh_vertex(
    camera: &Camera,
    light: &Light,
    bones: &BoneTransformStore,
    vertex: &SkinnedVertex,
) -> VertexOutput<MeshVaryings> {
    let skinned = skin(vertex.position(), &vertex.binding(), bones);
    let world_position = camera.world_position(skinned);

    VertexOutput {
        clip_position: camera.clip_position(world_position),
        varyings: MeshVaryings {
            world_position,
            light_dir: light.direction_from(world_position),
            uv: vertex.uv(),
            normal: (camera.world * vertex.normal().extend(0.0)).normalize(),
        },
    }
}

/// Displays the world-space normal remapped from [-1, 1] to [0, 1].
pub struct NormalPass<'a> {
    pub camera: &'a Camera,
    pub light: &'a Light,
    pub bones: &'a BoneTransformStore,
}

impl ShadingPass for NormalPass<'_> {
    type Vertex = SkinnedVertex;
    type Varyings = MeshVaryings;

    const KIND: PassKind = PassKind::Normal;

    fn vertex(&self, vertex: &SkinnedVertex) -> VertexOutput<MeshVaryings> {
        mesh_vertex(self.camera, self.light, self.bones, vertex)
    }

    fn fragment(&self, varyings: &MeshVaryings) -> Vec4 {
        ((varyings.normal.truncate() + 1.0) / 2.0).extend(1.0)
    }
}

/// Samples the bound texture at the interpolated UV.
pub struct TexturePass<'a> {
    pub camera: &'a Camera,
    pub light: &'a Light,
    pub bones: &'a BoneTransformStore,
    pub texture: &'a Texture2D,
}

impl ShadingPass for TexturePass<'_> {
    type Vertex = SkinnedVertex;
    type Varyings = MeshVaryings;

    const KIND: PassKind = PassKind::Texture;

    fn vertex(&self, vertex: &SkinnedVertex) -> VertexOutput<MeshVaryings> {
        mesh_vertex(self.camera, self.light, self.bones, vertex)
    }

    fn fragment(&self, varyings: &MeshVaryings) -> Vec4 {
        self.texture.sample(varyings.uv)
    }
}

/// Host copy of a 2D texture, sampled the way the default GPU sampler does:
/// nearest texel, coordinates clamped to the edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl Texture2D {
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Vec4) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            texels,
        }
    }

    /// `None` when `bytes` is not `width * height` RGBA8 texels.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))?;
        if len == 0 || bytes.len() != len {
            return None;
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|t| Vec4::new(t[0] as f32, t[1] as f32, t[2] as f32, t[3] as f32) / 255.0)
            .collect();
        Some(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = (uv.x * self.width as f32).floor().max(0.0) as u32;
        let y = (uv.y * self.height as f32).floor().max(0.0) as u32;
        self.texel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3, Mat4, Quat, Vec3};

    use super::*;
    use crate::{
        bones::Bone,
        passes::{run_vertex_stage, SkeletonPass},
        skin::SkinBinding,
        vertex::BoneSegmentVertex,
    };

    fn scene() -> (Camera, Light, BoneTransformStore) {
        let camera = Camera::look_at(
            vec3(3.0, 4.0, 8.0),
            Vec3::ZERO,
            Vec3::Y,
            1.5,
            1.0,
            0.1,
            100.0,
        )
        .with_world(Mat4::from_rotation_y(0.3));
        let light = Light::new(vec3(0.0, 10.0, 2.0));
        let bones = BoneTransformStore::from_bones([
            Bone::IDENTITY,
            Bone::new(vec3(0.0, 1.0, 0.0), Quat::from_rotation_z(0.7)),
            Bone::new(vec3(-2.0, 0.5, 1.0), Quat::from_rotation_x(-1.2)),
        ])
        .unwrap();
        (camera, light, bones)
    }

    #[test]
    fn rigid_mesh_vertex_lands_on_skeleton() {
        let (camera, light, bones) = scene();
        let mesh = NormalPass {
            camera: &camera,
            light: &light,
            bones: &bones,
        };
        let skeleton = SkeletonPass {
            camera: &camera,
            bones: &bones,
        };
        for bone in 0..3 {
            for p in [Vec3::X, vec3(0.5, -1.0, 2.0), vec3(-3.0, 0.25, 0.0)] {
                let skinned = mesh.vertex(&SkinnedVertex::new(
                    p,
                    Vec3::Y,
                    [0.0, 0.0],
                    SkinBinding::rigid(bone),
                ));
                let segment = skeleton.vertex(&BoneSegmentVertex::new(p, bone));
                assert!(skinned
                    .clip_position
                    .abs_diff_eq(segment.clip_position, 1e-5));
            }
        }
    }

    #[test]
    fn normal_is_world_transformed_not_skinned() {
        let (camera, light, bones) = scene();
        let pass = NormalPass {
            camera: &camera,
            light: &light,
            bones: &bones,
        };
        let out = pass.vertex(&SkinnedVertex::new(
            Vec3::ZERO,
            Vec3::Z,
            [0.0, 0.0],
            SkinBinding::rigid(1),
        ));
        let expected = (Mat4::from_rotation_y(0.3) * Vec4::Z).normalize();
        assert!(out.varyings.normal.abs_diff_eq(expected, 1e-6));
        assert_eq!(out.varyings.normal.w, 0.0);
    }

    #[test]
    fn normal_color_is_remapped() {
        let camera = Camera::default();
        let light = Light::default();
        let bones = BoneTransformStore::identity(1).unwrap();
        let pass = NormalPass {
            camera: &camera,
            light: &light,
            bones: &bones,
        };
        let out = pass.vertex(&SkinnedVertex::new(
            Vec3::ZERO,
            Vec3::NEG_Y,
            [0.0, 0.0],
            SkinBinding::rigid(0),
        ));
        assert_eq!(pass.fragment(&out.varyings), Vec4::new(0.5, 0.0, 0.5, 1.0));
    }

    #[test]
    fn light_direction_points_at_light() {
        let camera = Camera::default();
        let light = Light::new(vec3(0.0, 5.0, 0.0));
        let bones = BoneTransformStore::identity(1).unwrap();
        let pass = NormalPass {
            camera: &camera,
            light: &light,
            bones: &bones,
        };
        let out = pass.vertex(&SkinnedVertex::new(
            vec3(1.0, 1.0, 0.0),
            Vec3::Y,
            [0.25, 0.75],
            SkinBinding::rigid(0),
        ));
        assert_eq!(out.varyings.light_dir, Vec4::new(-1.0, 4.0, 0.0, 0.0));
        assert_eq!(out.varyings.uv, Vec2::new(0.25, 0.75));
    }

    #[test]
    fn texture_pass_samples_nearest_clamped() {
        let texture = Texture2D::from_fn(2, 2, |x, y| Vec4::new(x as f32, y as f32, 0.0, 1.0));
        let camera = Camera::default();
        let light = Light::default();
        let bones = BoneTransformStore::identity(1).unwrap();
        let pass = TexturePass {
            camera: &camera,
            light: &light,
            bones: &bones,
            texture: &texture,
        };
        let varyings = |u, v| MeshVaryings {
            world_position: Vec4::W,
            light_dir: Vec4::ZERO,
            uv: Vec2::new(u, v),
            normal: Vec4::Y,
        };
        assert_eq!(pass.fragment(&varyings(0.2, 0.2)), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(pass.fragment(&varyings(0.7, 0.2)), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(pass.fragment(&varyings(0.2, 0.9)), Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(pass.fragment(&varyings(1.5, -0.5)), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn rgba8_texture_requires_matching_length() {
        assert!(Texture2D::from_rgba8(2, 2, &[255; 16]).is_some());
        assert!(Texture2D::from_rgba8(2, 2, &[255; 12]).is_none());
        assert!(Texture2D::from_rgba8(0, 4, &[]).is_none());
        let t = Texture2D::from_rgba8(1, 1, &[255, 0, 51, 255]).unwrap();
        assert!(t.texel(0, 0).abs_diff_eq(Vec4::new(1.0, 0.0, 0.2, 1.0), 1e-6));
    }

    #[test]
    fn rgba8_texture_rejects_oversized_dimensions() {
        assert!(Texture2D::from_rgba8(70_000, 70_000, &[0u8; 16]).is_none());
        assert!(Texture2D::from_rgba8(u32::MAX, u32::MAX, &[0u8; 16]).is_none());
    }

    #[test]
    fn vertex_stage_runs_every_vertex() {
        let (camera, light, bones) = scene();
        let pass = NormalPass {
            camera: &camera,
            light: &light,
            bones: &bones,
        };
        let vertices: Vec<_> = (0..100)
            .map(|i| {
                SkinnedVertex::new(
                    vec3(i as f32 * 0.1, 0.0, 0.0),
                    Vec3::Y,
                    [0.0, 0.0],
                    SkinBinding::rigid(i % 3),
                )
            })
            .collect();
        let outputs = run_vertex_stage(&pass, &vertices);
        assert_eq!(outputs.len(), vertices.len());
        for (v, out) in vertices.iter().zip(&outputs) {
            assert_eq!(*out, pass.vertex(v));
        }
    }
}
