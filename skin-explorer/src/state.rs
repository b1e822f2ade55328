use std::path::Path;

use skinning::{bones::BoneTransformStore, camera::Camera, light::Light, passes::PassKind};

use crate::{error::RenderError, v::VMesh};

/// Sub-rectangle of the target in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Strip along the bottom edge covering `fraction` of the height.
    pub fn bottom_strip(width: u32, height: u32, fraction: f32) -> Self {
        let strip = (height as f32 * fraction.clamp(0.0, 1.0)).max(1.0);
        Self {
            x: 0.0,
            y: height as f32 - strip,
            width: width as f32,
            height: strip,
        }
    }
}

pub struct DrawCommand<'a> {
    pub pass: PassKind,
    pub mesh: &'a VMesh,
    /// Whole target when `None`.
    pub viewport: Option<Viewport>,
}

impl<'a> DrawCommand<'a> {
    pub fn new(pass: PassKind, mesh: &'a VMesh) -> Self {
        Self {
            pass,
            mesh,
            viewport: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

/// Everything constant over one frame, plus the draws that read it.
pub struct Frame<'a> {
    pub camera: Camera,
    pub light: Light,
    pub bones: BoneTransformStore,
    pub clear_color: wgpu::Color,
    pub draws: Vec<DrawCommand<'a>>,
}

impl<'a> Frame<'a> {
    pub fn new(camera: Camera, light: Light, bones: BoneTransformStore) -> Self {
        Self {
            camera,
            light,
            bones,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
            draws: Vec::new(),
        }
    }

    pub fn draw(&mut self, command: DrawCommand<'a>) {
        self.draws.push(command);
    }
}

/// Save tightly packed RGBA8 pixels as a PNG.
pub fn save_png(path: &Path, width: u32, height: u32, pixels: Vec<u8>) -> Result<(), RenderError> {
    let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        RenderError::Readback(format!("pixel buffer does not match {width}x{height}"))
    })?;
    image.save(path)?;
    Ok(())
}
