pub use crate::vbuffer::VBuffer;
pub use crate::vertex::Vertex;
pub use crate::vinstance::StateInstance;
pub use crate::vshader::{DepthMode, VShader};
pub use crate::vtexture::VTexture;
