pub mod config;
pub mod error;
pub mod rig;
pub mod state;
pub mod v;

pub use error::{ConfigError, RenderError};
