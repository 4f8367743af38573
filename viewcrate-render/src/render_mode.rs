//! Typed render modes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use viewcrate_core::Error;

/// Which image product a render produces.
///
/// The `*Scene` variants additionally render every object in the camera's
/// scene and composite it into the primary image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderMode {
    Segmask,
    Color,
    ColorScene,
    Depth,
    DepthScene,
    Rgbd,
    RgbdScene,
    ScaledDepth,
}

impl RenderMode {
    pub const ALL: [RenderMode; 8] = [
        RenderMode::Segmask,
        RenderMode::Color,
        RenderMode::ColorScene,
        RenderMode::Depth,
        RenderMode::DepthScene,
        RenderMode::Rgbd,
        RenderMode::RgbdScene,
        RenderMode::ScaledDepth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Segmask => "SEGMASK",
            RenderMode::Color => "COLOR",
            RenderMode::ColorScene => "COLOR_SCENE",
            RenderMode::Depth => "DEPTH",
            RenderMode::DepthScene => "DEPTH_SCENE",
            RenderMode::Rgbd => "RGBD",
            RenderMode::RgbdScene => "RGBD_SCENE",
            RenderMode::ScaledDepth => "SCALED_DEPTH",
        }
    }

    /// Masks and plain depth are rendered unlit
    pub fn lighting_enabled(self) -> bool {
        !matches!(
            self,
            RenderMode::Segmask | RenderMode::Depth | RenderMode::DepthScene
        )
    }

    /// The mode scene objects are rendered in, for compositing modes
    pub fn scene_base(self) -> Option<RenderMode> {
        match self {
            RenderMode::ColorScene => Some(RenderMode::Color),
            RenderMode::DepthScene => Some(RenderMode::Depth),
            RenderMode::RgbdScene => Some(RenderMode::Rgbd),
            _ => None,
        }
    }

    pub fn is_scene(self) -> bool {
        self.scene_base().is_some()
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    /// Parse a mode name, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedRenderMode(s.to_string()))
    }
}
