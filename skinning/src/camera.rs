use glam::{Mat4, Vec3, Vec4};

use crate::uniforms::CameraUniform;

/// World, view and projection matrices for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Camera {
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world,
            view,
            projection,
        }
    }

    /// Right handed perspective camera, `fovy` in radians, identity world matrix.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        aspect: f32,
        fovy: f32,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::look_at_rh(eye, target, up),
            projection: Mat4::perspective_rh(fovy, aspect, znear, zfar),
        }
    }

    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    pub fn view_inverse(&self) -> Mat4 {
        self.view.inverse()
    }

    pub fn projection_inverse(&self) -> Mat4 {
        self.projection.inverse()
    }

    /// World-transformed homogeneous position for a model-space point.
    pub fn world_position(&self, position: Vec3) -> Vec4 {
        self.world * position.extend(1.0)
    }

    /// Project an already world-transformed position.
    pub fn clip_position(&self, world_position: Vec4) -> Vec4 {
        self.projection * self.view * world_position
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform::from_camera(self)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}
