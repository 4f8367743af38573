//! Rigid transformations between named coordinate frames

use nalgebra::{Isometry3, Matrix3x4, Matrix4, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::point::{Point3d, Vector3d};

/// Default frame label for transforms created without explicit frames
pub const DEFAULT_FRAME: &str = "world";

/// Frame label of an object-centered frame
pub const OBJECT_FRAME: &str = "obj";

/// Frame label of a camera-centered frame
pub const CAMERA_FRAME: &str = "camera";

/// A rotation followed by a translation, mapping points expressed in
/// `from_frame` into `to_frame`.
///
/// Frame labels are bookkeeping only: composition does not reject
/// mismatched frames, it just carries the outer labels through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3d,
    pub from_frame: String,
    pub to_frame: String,
}

impl RigidTransform {
    /// Create a transform from a rotation, a translation and frame labels
    pub fn new(
        rotation: Rotation3<f64>,
        translation: Vector3d,
        from_frame: impl Into<String>,
        to_frame: impl Into<String>,
    ) -> Self {
        Self {
            rotation,
            translation,
            from_frame: from_frame.into(),
            to_frame: to_frame.into(),
        }
    }

    /// Create an identity transformation
    pub fn identity(from_frame: impl Into<String>, to_frame: impl Into<String>) -> Self {
        Self::new(Rotation3::identity(), Vector3d::zeros(), from_frame, to_frame)
    }

    /// Create a pure translation
    pub fn from_translation(
        translation: Vector3d,
        from_frame: impl Into<String>,
        to_frame: impl Into<String>,
    ) -> Self {
        Self::new(Rotation3::identity(), translation, from_frame, to_frame)
    }

    /// Same transform with different frame labels
    pub fn as_frames(&self, from_frame: impl Into<String>, to_frame: impl Into<String>) -> Self {
        Self {
            rotation: self.rotation,
            translation: self.translation,
            from_frame: from_frame.into(),
            to_frame: to_frame.into(),
        }
    }

    /// Get the inverse transformation, with frames swapped
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let translation = -(rotation * self.translation);
        Self {
            rotation,
            translation,
            from_frame: self.to_frame.clone(),
            to_frame: self.from_frame.clone(),
        }
    }

    /// Compose with another transform: `other` is applied first.
    ///
    /// The result maps `other.from_frame` into `self.to_frame`.
    pub fn dot(&self, other: &RigidTransform) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
            from_frame: other.from_frame.clone(),
            to_frame: self.to_frame.clone(),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3d) -> Point3d {
        self.rotation * point + self.translation
    }

    /// Apply the rotation part to a vector
    pub fn transform_vector(&self, vector: &Vector3d) -> Vector3d {
        self.rotation * vector
    }

    /// First column of the rotation matrix
    pub fn x_axis(&self) -> Vector3d {
        self.rotation.matrix().column(0).into_owned()
    }

    /// Second column of the rotation matrix
    pub fn y_axis(&self) -> Vector3d {
        self.rotation.matrix().column(1).into_owned()
    }

    /// Third column of the rotation matrix
    pub fn z_axis(&self) -> Vector3d {
        self.rotation.matrix().column(2).into_owned()
    }

    /// The `[R | t]` extrinsics block
    pub fn extrinsics(&self) -> Matrix3x4<f64> {
        let mut m = Matrix3x4::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(self.rotation.matrix());
        m.set_column(3, &self.translation);
        m
    }

    /// Homogeneous 4x4 matrix
    pub fn matrix(&self) -> Matrix4<f64> {
        self.to_isometry().to_homogeneous()
    }

    /// Convert to a nalgebra isometry, dropping the frame labels
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_rotation_matrix(&self.rotation),
        )
    }

    /// Check whether two transforms agree within `epsilon`, ignoring frames
    pub fn approx_eq(&self, other: &RigidTransform, epsilon: f64) -> bool {
        (self.rotation.matrix() - other.rotation.matrix()).amax() <= epsilon
            && (self.translation - other.translation).amax() <= epsilon
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity(DEFAULT_FRAME, DEFAULT_FRAME)
    }
}

impl std::ops::Mul for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(rhs)
    }
}

impl std::ops::Mul<&Point3d> for &RigidTransform {
    type Output = Point3d;

    fn mul(self, rhs: &Point3d) -> Self::Output {
        self.transform_point(rhs)
    }
}
