pub mod bones;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod light;
pub mod passes;
pub mod prelude;
pub mod shader;
pub mod skin;
pub mod uniforms;
pub mod validate;
pub mod vertex;

pub use error::DrawError;
