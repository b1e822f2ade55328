pub use crate::bones::{Bone, BoneTransformStore, MAX_BONES};
pub use crate::camera::Camera;
pub use crate::error::DrawError;
pub use crate::geometry::{MeshData, Tube};
pub use crate::light::Light;
pub use crate::passes::{PassKind, ShadingPass, Texture2D};
pub use crate::shader::ShaderConstants;
pub use crate::skin::{skin, SkinBinding};
pub use crate::uniforms::{BoneUniform, CameraUniform, LightUniform};
pub use crate::vertex::{
    BoneSegmentVertex, FloorVertex, PositionVertex, ScreenVertex, SkinnedVertex,
};
