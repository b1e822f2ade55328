pub mod prelude;
pub mod vbuffer;
pub mod vertex;
pub mod vinstance;
pub mod vshader;
pub mod vtexture;
