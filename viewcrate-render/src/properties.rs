//! Material and lighting parameters handed to the rasterizer

use serde::{Deserialize, Serialize};
use viewcrate_core::{RigidTransform, CAMERA_FRAME};

/// Frame label of the light source
pub const LIGHT_FRAME: &str = "light";

/// Surface material of a mesh.
///
/// Flattened as `[r, g, b, ambient, diffuse, specular, shininess]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProperties {
    pub color: [f32; 3],
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl MaterialProperties {
    pub const PARAM_COUNT: usize = 7;

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn to_params(&self) -> [f32; Self::PARAM_COUNT] {
        [
            self.color[0],
            self.color[1],
            self.color[2],
            self.ambient,
            self.diffuse,
            self.specular,
            self.shininess,
        ]
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            color: [0.5, 0.5, 0.5],
            ambient: 0.2,
            diffuse: 0.8,
            specular: 0.0,
            shininess: 0.0,
        }
    }
}

/// A spot light rigidly attached to the camera.
///
/// The light's pose relative to the object changes with every camera pose,
/// so [`LightingProperties::set_pose`] must run before each render. Flattened
/// as `[ambient, diffuse, specular, position(3), direction(3), cutoff]` with
/// position and direction in the object frame and cutoff in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingProperties {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    /// Light-to-camera transform
    pub light_to_camera: RigidTransform,
    /// Spot cutoff half-angle in degrees; 180 lights every direction
    pub cutoff: f32,
    #[serde(skip)]
    light_to_object: Option<RigidTransform>,
}

impl LightingProperties {
    pub const PARAM_COUNT: usize = 10;

    /// Place the light for a render from `object_to_camera`
    pub fn set_pose(&mut self, object_to_camera: &RigidTransform) {
        self.light_to_object = Some(object_to_camera.inverse().dot(&self.light_to_camera));
    }

    /// Light-to-object transform of the last [`set_pose`](Self::set_pose),
    /// or the light-to-camera transform if no pose was set
    pub fn light_to_object(&self) -> &RigidTransform {
        self.light_to_object.as_ref().unwrap_or(&self.light_to_camera)
    }

    pub fn to_params(&self) -> [f32; Self::PARAM_COUNT] {
        let pose = self.light_to_object();
        let position = pose.translation;
        let direction = pose.z_axis();
        [
            self.ambient,
            self.diffuse,
            self.specular,
            position.x as f32,
            position.y as f32,
            position.z as f32,
            direction.x as f32,
            direction.y as f32,
            direction.z as f32,
            self.cutoff,
        ]
    }
}

impl Default for LightingProperties {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            diffuse: 1.0,
            specular: 1.0,
            light_to_camera: RigidTransform::identity(LIGHT_FRAME, CAMERA_FRAME),
            cutoff: 180.0,
            light_to_object: None,
        }
    }
}

/// Per-call rendering configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub material: MaterialProperties,
    pub lighting: LightingProperties,
    /// Forwarded to the rasterizer
    pub debug: bool,
}

impl RenderOptions {
    pub fn with_material(mut self, material: MaterialProperties) -> Self {
        self.material = material;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingProperties) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
