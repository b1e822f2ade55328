use glam::{Vec3, Vec4};

use crate::uniforms::LightUniform;

/// Single point light shared by the mesh and floor passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Homogeneous world position, w = 1.
    pub position: Vec4,
}

impl Light {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.extend(1.0),
        }
    }

    /// Unnormalized direction from `world_position` towards the light.
    pub fn direction_from(&self, world_position: Vec4) -> Vec4 {
        self.position - world_position
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position.to_array(),
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 10.0, 0.0))
    }
}
