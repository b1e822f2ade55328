//! Linear blend skinning shared by every pass that deforms geometry.
//!
//! The WGSL routine in `shaders/skin.wgsl` is the GPU twin of this module and
//! must stay term-for-term identical with it.

use glam::{Quat, Vec3};
use rayon::prelude::*;

use crate::{bones::BoneTransformStore, error::DrawError, vertex::SkinnedVertex};

/// Bone influences a vertex can carry.
pub const MAX_INFLUENCES: usize = 4;

/// Rotate `v` by the unit quaternion `q`.
///
/// Closed form of `q * v * q⁻¹`: `v + 2 * cross(cross(v, q.xyz) - q.w * v, q.xyz)`.
/// With this convention a quarter turn about +Y takes +X to -Z, the same
/// result as `q * v` in glam.
#[inline]
pub fn rotate(q: Quat, v: Vec3) -> Vec3 {
    let u = Vec3::new(q.x, q.y, q.z);
    v + 2.0 * (v.cross(u) - q.w * v).cross(u)
}

/// Convert a real-valued bone channel to an index by truncation.
///
/// Negative and non-finite values are not indices.
#[inline]
pub fn bone_index(channel: f32) -> Option<u32> {
    if channel.is_finite() && channel >= 0.0 {
        Some(channel.trunc() as u32)
    } else {
        None
    }
}

/// Up to four `(bone, weight)` pairs, kept as the real-valued channels the
/// vertex stage reads.
///
/// Weights are expected to sum to one. Nothing renormalizes them implicitly;
/// a binding that breaks the rule deforms proportionally wrong.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkinBinding {
    pub indices: [f32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl SkinBinding {
    /// Bound entirely to one bone.
    pub fn rigid(bone: u32) -> Self {
        Self {
            indices: [bone as f32, 0.0, 0.0, 0.0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Unused slots are filled with bone 0 and weight 0.
    pub fn from_influences(
        influences: impl IntoIterator<Item = (u32, f32)>,
    ) -> Result<Self, DrawError> {
        let mut binding = Self::default();
        let mut count = 0;
        for (bone, weight) in influences {
            if count < MAX_INFLUENCES {
                binding.indices[count] = bone as f32;
                binding.weights[count] = weight;
            }
            count += 1;
        }
        if count > MAX_INFLUENCES {
            return Err(DrawError::TooManyInfluences { count });
        }
        Ok(binding)
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Weights divided by their sum. Opt-in only, the evaluator never calls it.
    pub fn normalized(&self) -> Self {
        let sum = self.weight_sum();
        if sum == 0.0 {
            return *self;
        }
        Self {
            indices: self.indices,
            weights: self.weights.map(|w| w / sum),
        }
    }

    /// Slots whose channel decodes to a bone index, with their weight.
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.weights.iter())
            .filter_map(|(&index, &weight)| bone_index(index).map(|i| (i, weight)))
    }
}

/// Weighted blend of the bone-local transforms of `position`.
pub fn skin(position: Vec3, binding: &SkinBinding, bones: &BoneTransformStore) -> Vec3 {
    let mut result = Vec3::ZERO;
    for (index, weight) in binding.influences() {
        result += weight * bones.apply(index, position);
    }
    result
}

/// One bone, no blending. Used for bone-segment geometry.
#[inline]
pub fn skin_rigid(position: Vec3, bone: u32, bones: &BoneTransformStore) -> Vec3 {
    bones.apply(bone, position)
}

/// Deform a whole vertex buffer, one independent invocation per vertex.
pub fn skin_vertices(vertices: &[SkinnedVertex], bones: &BoneTransformStore) -> Vec<Vec3> {
    vertices
        .par_iter()
        .map(|v| skin(v.position(), &v.binding(), bones))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_4;

    use glam::vec3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::bones::{Bone, MAX_BONES};

    const EPS: f32 = 1e-5;

    fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
        vec3(
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
        )
    }

    fn random_rotation(rng: &mut StdRng) -> Quat {
        loop {
            let axis = random_vec(rng, 1.0);
            if axis.length() > 0.1 {
                let angle = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
                return Quat::from_axis_angle(axis.normalize(), angle);
            }
        }
    }

    fn random_pose(rng: &mut StdRng, count: usize) -> BoneTransformStore {
        BoneTransformStore::from_bones(
            (0..count).map(|_| Bone::new(random_vec(rng, 5.0), random_rotation(rng))),
        )
        .unwrap()
    }

    fn random_binding(rng: &mut StdRng, bone_count: u32) -> SkinBinding {
        let raw: [f32; 4] = [rng.gen(), rng.gen(), rng.gen(), rng.gen::<f32>() + 0.01];
        let sum: f32 = raw.iter().sum();
        SkinBinding::from_influences(
            raw.iter()
                .map(|w| (rng.gen_range(0..bone_count), w / sum))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn rotation_preserves_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let q = random_rotation(&mut rng);
            let v = random_vec(&mut rng, 10.0);
            let r = rotate(q, v);
            assert!((r.length() - v.length()).abs() <= EPS * v.length().max(1.0));
        }
    }

    #[test]
    fn rotation_matches_quaternion_product() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            let q = random_rotation(&mut rng);
            let v = random_vec(&mut rng, 10.0);
            assert!(rotate(q, v).abs_diff_eq(q * v, 1e-4));
        }
    }

    #[test]
    fn rigid_binding_matches_bone_segment() {
        let mut rng = StdRng::seed_from_u64(3);
        let bones = random_pose(&mut rng, MAX_BONES);
        for _ in 0..1000 {
            let bone = rng.gen_range(0..MAX_BONES as u32);
            let v = random_vec(&mut rng, 3.0);
            let blended = skin(v, &SkinBinding::rigid(bone), &bones);
            let rigid = skin_rigid(v, bone, &bones);
            assert!(blended.abs_diff_eq(rigid, EPS), "{blended} != {rigid}");
        }
    }

    #[test]
    fn identity_pose_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(4);
        let bones = BoneTransformStore::identity(MAX_BONES).unwrap();
        for _ in 0..1000 {
            let binding = random_binding(&mut rng, MAX_BONES as u32);
            let v = random_vec(&mut rng, 3.0);
            assert!(skin(v, &binding, &bones).abs_diff_eq(v, 1e-4));
        }
    }

    #[test]
    fn blend_is_a_weighted_average() {
        let mut rng = StdRng::seed_from_u64(5);
        let bones = random_pose(&mut rng, 8);
        for _ in 0..500 {
            let binding = random_binding(&mut rng, 8);
            let doubled = SkinBinding {
                indices: binding.indices,
                weights: binding.weights.map(|w| w * 2.0),
            };
            let v = random_vec(&mut rng, 3.0);
            let expected = skin(v, &binding, &bones);
            assert!(skin(v, &doubled.normalized(), &bones).abs_diff_eq(expected, 1e-4));
            // Without renormalization the doubled weights double the result.
            assert!(skin(v, &doubled, &bones).abs_diff_eq(2.0 * expected, 1e-3));
        }
    }

    #[test]
    fn single_identity_bone() {
        let bones = BoneTransformStore::identity(1).unwrap();
        let p = skin(Vec3::X, &SkinBinding::rigid(0), &bones);
        assert!(p.abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn quarter_turn_about_y() {
        let rotation = Quat::from_xyzw(0.0, FRAC_PI_4.sin(), 0.0, FRAC_PI_4.cos());
        let bones = BoneTransformStore::from_bones([Bone::new(Vec3::ZERO, rotation)]).unwrap();
        let p = skin(Vec3::X, &SkinBinding::rigid(0), &bones);
        assert!(p.abs_diff_eq(vec3(0.0, 0.0, -1.0), EPS), "{p}");
    }

    #[test]
    fn bone_channel_truncates() {
        assert_eq!(bone_index(0.0), Some(0));
        assert_eq!(bone_index(2.99), Some(2));
        assert_eq!(bone_index(63.5), Some(63));
        assert_eq!(bone_index(-1.0), None);
        assert_eq!(bone_index(f32::NAN), None);
        assert_eq!(bone_index(f32::INFINITY), None);
    }

    #[test]
    fn unused_slots_are_zeroed() {
        let binding = SkinBinding::from_influences([(5, 0.25), (7, 0.75)]).unwrap();
        assert_eq!(binding.indices, [5.0, 7.0, 0.0, 0.0]);
        assert_eq!(binding.weights, [0.25, 0.75, 0.0, 0.0]);
        assert_eq!(
            SkinBinding::from_influences((0..5).map(|i| (i, 0.2))),
            Err(DrawError::TooManyInfluences { count: 5 })
        );
    }

    #[test]
    fn weights_are_not_renormalized() {
        let bones = BoneTransformStore::identity(2).unwrap();
        let binding = SkinBinding::from_influences([(0, 0.25), (1, 0.25)]).unwrap();
        let p = skin(vec3(2.0, 4.0, 0.0), &binding, &bones);
        assert!(p.abs_diff_eq(vec3(1.0, 2.0, 0.0), EPS));
    }

    #[test]
    fn parallel_buffer_matches_per_vertex() {
        let mut rng = StdRng::seed_from_u64(6);
        let bones = random_pose(&mut rng, 4);
        let vertices: Vec<SkinnedVertex> = (0..256)
            .map(|_| {
                SkinnedVertex::new(
                    random_vec(&mut rng, 2.0),
                    Vec3::Y,
                    [0.0, 0.0],
                    random_binding(&mut rng, 4),
                )
            })
            .collect();
        let skinned = skin_vertices(&vertices, &bones);
        for (v, p) in vertices.iter().zip(&skinned) {
            assert_eq!(*p, skin(v.position(), &v.binding(), &bones));
        }
    }
}
