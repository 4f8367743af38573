//! Pinhole camera intrinsics

use nalgebra::{Matrix3, Point2};
use serde::{Deserialize, Serialize};

use crate::point::Point3d;
use crate::{Error, Result};

/// Intrinsic parameters of a pinhole camera.
///
/// Pixel coordinates follow the image convention: `u` grows along the
/// image columns, `v` along the rows, and the camera looks down +z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Frame label carried by images rendered with these intrinsics
    pub frame: String,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub skew: f64,
    pub width: u32,
    pub height: u32,
}

impl CameraIntrinsics {
    /// Create validated intrinsics with zero skew
    pub fn new(
        frame: impl Into<String>,
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let intrinsics = Self {
            frame: frame.into(),
            fx,
            fy,
            cx,
            cy,
            skew: 0.0,
            width,
            height,
        };
        intrinsics.validate()?;
        Ok(intrinsics)
    }

    /// Check the parameters describe a usable camera
    pub fn validate(&self) -> Result<()> {
        if !(self.fx.is_finite() && self.fx > 0.0 && self.fy.is_finite() && self.fy > 0.0) {
            return Err(Error::InvalidIntrinsics(format!(
                "focal lengths must be positive and finite, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite() && self.skew.is_finite()) {
            return Err(Error::InvalidIntrinsics(format!(
                "principal point must be finite, got ({}, {})",
                self.cx, self.cy
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidIntrinsics(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// The 3x3 camera matrix `K`
    #[rustfmt::skip]
    pub fn proj_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, self.skew, self.cx,
            0.0, self.fy, self.cy,
            0.0, 0.0, 1.0,
        )
    }

    /// Project a point in the camera frame to pixel coordinates.
    ///
    /// Returns `None` for points on the camera plane (`z == 0`).
    pub fn project(&self, point: &Point3d) -> Option<Point2<f64>> {
        if point.z == 0.0 {
            return None;
        }
        let p = self.proj_matrix() * point.coords;
        Some(Point2::new(p.x / p.z, p.y / p.z))
    }

    /// Copy of these intrinsics with a different principal point
    pub fn with_principal_point(&self, cx: f64, cy: f64) -> Self {
        Self {
            cx,
            cy,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            CameraIntrinsics::new("camera", 0.0, 500.0, 320.0, 240.0, 640, 480),
            Err(Error::InvalidIntrinsics(_))
        ));
        assert!(matches!(
            CameraIntrinsics::new("camera", 500.0, 500.0, 320.0, 240.0, 0, 480),
            Err(Error::InvalidIntrinsics(_))
        ));
        assert!(matches!(
            CameraIntrinsics::new("camera", 500.0, 500.0, f64::NAN, 240.0, 640, 480),
            Err(Error::InvalidIntrinsics(_))
        ));
    }

    #[test]
    fn test_project_optical_axis_hits_principal_point() {
        let k = CameraIntrinsics::new("camera", 500.0, 520.0, 320.0, 240.0, 640, 480).unwrap();
        let uv = k.project(&Point3d::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(uv, Point2::new(320.0, 240.0));

        let uv = k.project(&Point3d::new(0.1, -0.2, 1.0)).unwrap();
        assert_relative_eq!(uv, Point2::new(370.0, 136.0), epsilon = 1e-9);
        assert!(k.project(&Point3d::new(1.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn test_with_principal_point_leaves_original_untouched() {
        let k = CameraIntrinsics::new("camera", 500.0, 500.0, 320.0, 240.0, 640, 480).unwrap();
        let shifted = k.with_principal_point(300.0, 250.0);
        assert_eq!(k.cx, 320.0);
        assert_eq!(shifted.cx, 300.0);
        assert_eq!(shifted.cy, 250.0);
        assert_eq!(shifted.fx, k.fx);
        assert_eq!(shifted.width, k.width);
    }
}
