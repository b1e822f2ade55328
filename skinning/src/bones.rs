use glam::{Quat, Vec3};

use crate::{error::DrawError, skin::rotate, uniforms::BoneUniform};

/// Upper bound on the bones a single draw call can address.
pub const MAX_BONES: usize = 64;

/// Current pose of one bone: an offset from the bind pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    pub translation: Vec3,
    /// Unit quaternion, stored (x, y, z, w).
    pub rotation: Quat,
}

impl Bone {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Rotation about `pivot` instead of the origin.
    pub fn rotation_about(pivot: Vec3, rotation: Quat) -> Self {
        Self::new(pivot - rotate(rotation, pivot), rotation)
    }

    /// Transform a bind-pose position by this bone.
    ///
    /// Every pass that deforms geometry goes through here, blended or rigid.
    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.translation + rotate(self.rotation, v)
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The pose uploaded for one frame, indexed by bone id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTransformStore {
    bones: Vec<Bone>,
}

impl BoneTransformStore {
    pub fn new() -> Self {
        Self {
            bones: Vec::with_capacity(MAX_BONES),
        }
    }

    pub fn identity(count: usize) -> Result<Self, DrawError> {
        Self::from_bones(std::iter::repeat(Bone::IDENTITY).take(count))
    }

    pub fn from_bones(bones: impl IntoIterator<Item = Bone>) -> Result<Self, DrawError> {
        let bones: Vec<Bone> = bones.into_iter().collect();
        if bones.len() > MAX_BONES {
            return Err(DrawError::TooManyBones { count: bones.len() });
        }
        Ok(Self { bones })
    }

    /// Append a bone, returning its index.
    pub fn push(&mut self, bone: Bone) -> Result<u32, DrawError> {
        if self.bones.len() == MAX_BONES {
            return Err(DrawError::TooManyBones {
                count: MAX_BONES + 1,
            });
        }
        self.bones.push(bone);
        Ok(self.bones.len() as u32 - 1)
    }

    pub fn set(&mut self, index: u32, bone: Bone) -> Result<(), DrawError> {
        let bone_count = self.bones.len();
        match self.bones.get_mut(index as usize) {
            Some(slot) => {
                *slot = bone;
                Ok(())
            }
            None => Err(DrawError::BoneNotUploaded {
                index,
                uploaded: bone_count,
            }),
        }
    }

    pub fn get(&self, index: u32) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Apply bone `index` to `v`.
    ///
    /// Indices are checked against the store when the draw is submitted. An
    /// index past the uploaded bones reads the identity, as the padded
    /// uniform slots do on the GPU.
    #[inline]
    pub fn apply(&self, index: u32, v: Vec3) -> Vec3 {
        self.get(index).map_or(v, |bone| bone.apply(v))
    }

    pub fn to_uniform(&self) -> BoneUniform {
        BoneUniform::from_bones(&self.bones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_bounded() {
        let mut store = BoneTransformStore::identity(MAX_BONES).unwrap();
        assert_eq!(store.len(), MAX_BONES);
        assert_eq!(
            store.push(Bone::IDENTITY),
            Err(DrawError::TooManyBones {
                count: MAX_BONES + 1
            })
        );
        assert!(BoneTransformStore::identity(MAX_BONES + 1).is_err());
    }

    #[test]
    fn set_requires_uploaded_index() {
        let mut store = BoneTransformStore::identity(2).unwrap();
        let moved = Bone::new(Vec3::X, Quat::IDENTITY);
        store.set(1, moved).unwrap();
        assert_eq!(store.get(1), Some(&moved));
        assert_eq!(
            store.set(2, moved),
            Err(DrawError::BoneNotUploaded {
                index: 2,
                uploaded: 2
            })
        );
    }

    #[test]
    fn bone_past_store_reads_identity() {
        let store = BoneTransformStore::from_bones([Bone::new(Vec3::X, Quat::IDENTITY)]).unwrap();
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(store.apply(0, v), v + Vec3::X);
        assert_eq!(store.apply(1, v), v);
        assert_eq!(store.apply(MAX_BONES as u32, v), v);

        let padded = store.to_uniform();
        assert_eq!(padded.translations[1], [0.0; 4]);
        assert_eq!(padded.rotations[1], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rotation_about_keeps_pivot_fixed() {
        let pivot = Vec3::new(0.0, 2.0, 0.0);
        let bone = Bone::rotation_about(pivot, Quat::from_rotation_z(1.0));
        assert!(bone.apply(pivot).abs_diff_eq(pivot, 1e-5));
        let above = bone.apply(Vec3::new(0.0, 3.0, 0.0));
        assert!((above.distance(pivot) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn push_returns_index() {
        let mut store = BoneTransformStore::new();
        assert_eq!(store.push(Bone::IDENTITY), Ok(0));
        assert_eq!(store.push(Bone::IDENTITY), Ok(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn translation_is_applied_after_rotation() {
        let bone = Bone::new(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let p = bone.apply(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-6));
    }
}
