pub mod vmesh;
pub mod vrenderer;

pub use vmesh::{MeshLayout, VMesh};
pub use vrenderer::VRenderer;
