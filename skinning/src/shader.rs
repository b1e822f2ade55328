//! WGSL sources for every pass, assembled from shared pieces.
//!
//! The skinning routine lives in one file and is pasted into every pass that
//! deforms geometry, so the passes cannot drift apart. Constants shared with
//! the CPU stages are generated from their Rust definitions.

use std::{borrow::Cow, fmt::Write};

use glam::Vec4;

use crate::{
    bones::MAX_BONES,
    passes::{
        PassKind, DEFAULT_CHECKER_WIDTH, HIGHLIGHT_COLOR, SCRUBBER_BACKGROUND,
        SCRUBBER_MARKERS, SCRUBBER_MARKER_COLOR, SCRUBBER_MARKER_HALF_WIDTH, SKELETON_COLOR,
    },
};

const CAMERA_WGSL: &str = include_str!("shaders/camera.wgsl");
const LIGHT_WGSL: &str = include_str!("shaders/light.wgsl");
const SKIN_WGSL: &str = include_str!("shaders/skin.wgsl");
const MESH_WGSL: &str = include_str!("shaders/mesh.wgsl");
const NORMAL_WGSL: &str = include_str!("shaders/normal.wgsl");
const TEXTURE_WGSL: &str = include_str!("shaders/texture.wgsl");
const SKELETON_WGSL: &str = include_str!("shaders/skeleton.wgsl");
const HIGHLIGHT_WGSL: &str = include_str!("shaders/highlight.wgsl");
const FLOOR_WGSL: &str = include_str!("shaders/floor.wgsl");
const SCRUBBER_WGSL: &str = include_str!("shaders/scrubber.wgsl");

/// Values baked into the generated sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderConstants {
    pub checker_width: f32,
}

impl Default for ShaderConstants {
    fn default() -> Self {
        Self {
            checker_width: DEFAULT_CHECKER_WIDTH,
        }
    }
}

impl ShaderConstants {
    fn prelude(&self) -> String {
        let mut prelude = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(prelude, "const MAX_BONES: u32 = {MAX_BONES}u;");
        let _ = writeln!(
            prelude,
            "const CHECKER_WIDTH: f32 = {};",
            wgsl_float(self.checker_width)
        );
        let colors = [
            ("SKELETON_COLOR", SKELETON_COLOR),
            ("HIGHLIGHT_COLOR", HIGHLIGHT_COLOR),
            ("SCRUBBER_BACKGROUND", SCRUBBER_BACKGROUND),
            ("SCRUBBER_MARKER_COLOR", SCRUBBER_MARKER_COLOR),
        ];
        for (name, color) in colors {
            let _ = writeln!(prelude, "const {name}: vec4<f32> = {};", wgsl_vec4(color));
        }
        let _ = writeln!(
            prelude,
            "const SCRUBBER_MARKER_LOW: f32 = {};",
            wgsl_float(SCRUBBER_MARKERS[0])
        );
        let _ = writeln!(
            prelude,
            "const SCRUBBER_MARKER_HIGH: f32 = {};",
            wgsl_float(SCRUBBER_MARKERS[1])
        );
        let _ = writeln!(
            prelude,
            "const SCRUBBER_MARKER_HALF_WIDTH: f32 = {};",
            wgsl_float(SCRUBBER_MARKER_HALF_WIDTH)
        );
        prelude
    }
}

fn wgsl_float(value: f32) -> String {
    // Debug formatting always keeps a fractional part or an exponent.
    format!("{value:?}")
}

fn wgsl_vec4(v: Vec4) -> String {
    format!(
        "vec4<f32>({}, {}, {}, {})",
        wgsl_float(v.x),
        wgsl_float(v.y),
        wgsl_float(v.z),
        wgsl_float(v.w)
    )
}

/// Full WGSL module for `kind`, with `vs_main` and `fs_main` entry points.
pub fn wgsl_source(kind: PassKind, constants: &ShaderConstants) -> String {
    let mut parts = vec![constants.prelude()];
    if kind.uses_camera() {
        parts.push(CAMERA_WGSL.to_owned());
    }
    if kind.uses_light() {
        parts.push(LIGHT_WGSL.to_owned());
    }
    if kind.is_skinned() {
        parts.push(SKIN_WGSL.to_owned());
    }
    let body: &[&str] = match kind {
        PassKind::Normal => &[MESH_WGSL, NORMAL_WGSL],
        PassKind::Texture => &[MESH_WGSL, TEXTURE_WGSL],
        PassKind::Skeleton => &[SKELETON_WGSL],
        PassKind::Highlight => &[HIGHLIGHT_WGSL],
        PassKind::Floor => &[FLOOR_WGSL],
        PassKind::Scrubber => &[SCRUBBER_WGSL],
    };
    parts.extend(body.iter().map(|s| s.to_string()));
    parts.join("\n")
}

pub fn create_shader_module(
    device: &wgpu::Device,
    kind: PassKind,
    constants: &ShaderConstants,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(wgsl_source(kind, constants))),
    })
}
