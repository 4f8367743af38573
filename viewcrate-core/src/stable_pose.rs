//! Stable resting poses of an object on a planar surface

use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};

use crate::point::{Point3d, Vector3d};
use crate::transform::RigidTransform;

/// Frame label of the stable pose frame
pub const STABLE_POSE_FRAME: &str = "stp";

/// An orientation in which an object rests on a plane under gravity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StablePose {
    /// Probability of the object landing in this pose
    pub probability: f64,
    /// Rotation from the object frame into the stable pose frame
    pub rotation: Rotation3<f64>,
    /// A point of the object that touches the resting plane, in the object frame
    pub x0: Point3d,
}

impl StablePose {
    pub fn new(probability: f64, rotation: Rotation3<f64>, x0: Point3d) -> Self {
        Self {
            probability,
            rotation,
            x0,
        }
    }

    /// Transform from the object frame to the stable pose frame.
    ///
    /// The object is rotated into its resting orientation and lifted so
    /// the contact point `x0` lies on the plane `z = 0`.
    pub fn object_to_stable_pose(&self, object_frame: &str) -> RigidTransform {
        let lowest = self.rotation * self.x0.coords;
        RigidTransform::new(
            self.rotation,
            Vector3d::new(0.0, 0.0, -lowest.z),
            object_frame,
            STABLE_POSE_FRAME,
        )
    }
}
