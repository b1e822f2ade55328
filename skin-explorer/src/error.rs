use skinning::{passes::PassKind, DrawError};
use thiserror::Error;

use crate::v::MeshLayout;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to open device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("draw refused: {0}")]
    Draw(#[from] DrawError),
    #[error("the {} pass cannot draw {layout:?} vertices", pass.label())]
    LayoutMismatch { pass: PassKind, layout: MeshLayout },
    #[error("no pipeline was built for the {} pass", .0.label())]
    MissingPipeline(PassKind),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("color readback failed: {0}")]
    Readback(String),
    #[error("failed to save image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Load(#[from] ini::Error),
    #[error("[{section}] {key} = '{value}': {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}
