use std::{fmt::Display, path::PathBuf, str::FromStr};

use glam::{vec3, Vec3};
use ini::Ini;
use skinning::passes::{PassKind, DEFAULT_CHECKER_WIDTH};

use crate::error::ConfigError;

/// Settings read from `conf.ini`. Every key is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    /// Passes to draw, in order.
    pub passes: Vec<PassKind>,
    pub output: PathBuf,

    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,

    pub light: Vec3,

    pub floor_height: f32,
    /// Half size of a finite floor. The floor reaches the horizon when unset.
    pub floor_extent: Option<f32>,
    pub checker_width: f32,

    /// Joint angle of the demo rig in degrees.
    pub bend: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            passes: vec![
                PassKind::Floor,
                PassKind::Normal,
                PassKind::Texture,
                PassKind::Skeleton,
                PassKind::Highlight,
                PassKind::Scrubber,
            ],
            output: PathBuf::from("frame.png"),
            eye: vec3(6.0, 4.0, 8.0),
            target: vec3(0.0, 2.0, 0.0),
            fovy: 45.0,
            light: vec3(0.0, 10.0, 0.0),
            floor_height: 0.0,
            floor_extent: None,
            checker_width: DEFAULT_CHECKER_WIDTH,
            bend: 45.0,
        }
    }
}

fn get<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))?.get(key).map(str::trim)
}

fn invalid(
    section: &'static str,
    key: &'static str,
    value: &str,
    reason: impl Display,
) -> ConfigError {
    ConfigError::Invalid {
        section,
        key,
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}

fn parse<T>(
    ini: &Ini,
    section: &'static str,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(ini, section, key) {
        Some(value) => value.parse().map_err(|e| invalid(section, key, value, e)),
        None => Ok(default),
    }
}

fn parse_vec3(
    ini: &Ini,
    section: &'static str,
    key: &'static str,
    default: Vec3,
) -> Result<Vec3, ConfigError> {
    let Some(value) = get(ini, section, key) else {
        return Ok(default);
    };
    let components = value
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(section, key, value, e))?;
    match components[..] {
        [x, y, z] => Ok(vec3(x, y, z)),
        _ => Err(invalid(section, key, value, "expected three components")),
    }
}

fn parse_passes(ini: &Ini, default: Vec<PassKind>) -> Result<Vec<PassKind>, ConfigError> {
    let Some(value) = get(ini, "render", "passes") else {
        return Ok(default);
    };
    value
        .split(',')
        .filter(|label| !label.trim().is_empty())
        .map(|label| {
            PassKind::from_label(label).ok_or_else(|| {
                let reason = format!("unknown pass '{}'", label.trim());
                invalid("render", "passes", value, reason)
            })
        })
        .collect()
}

fn positive(section: &'static str, key: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(section, key, &value.to_string(), "must be positive"))
    }
}

impl ViewerConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let d = Self::default();

        let width = parse(ini, "render", "width", d.width)?;
        let height = parse(ini, "render", "height", d.height)?;
        if width == 0 || height == 0 {
            return Err(invalid(
                "render",
                "width",
                &format!("{width}x{height}"),
                "frame must not be empty",
            ));
        }

        Ok(Self {
            width,
            height,
            passes: parse_passes(ini, d.passes)?,
            output: get(ini, "render", "output").map_or(d.output, PathBuf::from),
            eye: parse_vec3(ini, "camera", "eye", d.eye)?,
            target: parse_vec3(ini, "camera", "target", d.target)?,
            fovy: positive("camera", "fovy", parse(ini, "camera", "fovy", d.fovy)?)?,
            light: parse_vec3(ini, "light", "position", d.light)?,
            floor_height: parse(ini, "floor", "height", d.floor_height)?,
            floor_extent: match get(ini, "floor", "extent") {
                Some(_) => {
                    let extent = parse(ini, "floor", "extent", 0.0)?;
                    Some(positive("floor", "extent", extent)?)
                }
                None => d.floor_extent,
            },
            checker_width: positive(
                "floor",
                "checker_width",
                parse(ini, "floor", "checker_width", d.checker_width)?,
            )?,
            bend: parse(ini, "rig", "bend", d.bend)?,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
