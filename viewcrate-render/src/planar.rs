//! Camera poses over a viewing sphere translated along a planar worksurface

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use viewcrate_core::{
    CameraIntrinsics, Error, Point3d, Result, RigidTransform, Vector3d, CAMERA_FRAME, OBJECT_FRAME,
};

use crate::grid::{sphere_center, CameraFrame, PlanarGrid};

/// Poses produced by [`PlanarWorksurfaceDiscretizer::object_to_camera_poses`].
///
/// The three sequences are parallel: entry `i` of each belongs to the same
/// grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarPoses {
    /// Object-to-camera transforms including the planar offset
    pub object_to_camera_poses: Vec<RigidTransform>,
    /// The same orientations with the planar offset removed
    pub normalized_poses: Vec<RigidTransform>,
    /// Intrinsics whose principal point is shifted so the displaced object
    /// origin projects to the original principal point
    pub shifted_intrinsics: Vec<CameraIntrinsics>,
}

impl PlanarPoses {
    pub fn len(&self) -> usize {
        self.object_to_camera_poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_to_camera_poses.is_empty()
    }
}

/// Virtual cameras around a viewing sphere whose center is additionally
/// translated by `(x, y, 0)` in the object frame.
///
/// The camera orientation depends only on the spherical coordinates; the
/// offset moves the camera without turning it, as if the object slid across
/// a table under a fixed camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanarGrid", into = "PlanarGrid")]
pub struct PlanarWorksurfaceDiscretizer {
    grid: PlanarGrid,
}

impl PlanarWorksurfaceDiscretizer {
    pub fn new(grid: PlanarGrid) -> Result<Self> {
        grid.validate()?;
        Ok(Self { grid })
    }

    pub fn grid(&self) -> &PlanarGrid {
        &self.grid
    }

    /// Poses and recentered intrinsics for every grid point, with the x/y
    /// offsets as the innermost loops.
    pub fn object_to_camera_poses(&self, intrinsics: &CameraIntrinsics) -> Result<PlanarPoses> {
        intrinsics.validate()?;

        let sphere = &self.grid.sphere;
        let radii = sphere.radius.closed_samples();
        let elevations = sphere.elevation.closed_samples();
        let azimuths = sphere.azimuth.periodic_samples();
        let rolls = sphere.roll.periodic_samples();
        let xs = self.grid.x.closed_samples();
        let ys = self.grid.y.closed_samples();

        let mut poses = PlanarPoses {
            object_to_camera_poses: Vec::new(),
            normalized_poses: Vec::new(),
            shifted_intrinsics: Vec::new(),
        };

        for (&radius, &elevation, &azimuth, &roll, &x, &y) in iproduct!(
            radii.iter(),
            elevations.iter(),
            azimuths.iter(),
            rolls.iter(),
            xs.iter(),
            ys.iter()
        ) {
            let index = poses.len();
            let center = sphere_center(radius, elevation, azimuth);
            let frame = CameraFrame::looking_at_origin(&center, roll);
            if frame.flipped {
                log::trace!("Flipping camera x axis for pose {}", index);
            }

            let offset = Vector3d::new(x, y, 0.0);
            let displaced = RigidTransform::new(
                frame.rotation,
                center.coords + offset,
                CAMERA_FRAME,
                OBJECT_FRAME,
            )
            .inverse();
            let normalized =
                RigidTransform::new(frame.rotation, center.coords, CAMERA_FRAME, OBJECT_FRAME)
                    .inverse();

            let shifted = recenter(intrinsics, &displaced).ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "planar offset ({}, {}) puts the object origin on the camera plane at pose {}",
                    x, y, index
                ))
            })?;

            poses.object_to_camera_poses.push(displaced);
            poses.normalized_poses.push(normalized);
            poses.shifted_intrinsics.push(shifted);
        }

        Ok(poses)
    }
}

/// Depth below which the object origin counts as lying on the camera plane
const CAMERA_PLANE_EPSILON: f64 = 1e-12;

/// Shift the principal point so the object origin, seen through
/// `object_to_camera`, reprojects onto the original principal point.
fn recenter(
    intrinsics: &CameraIntrinsics,
    object_to_camera: &RigidTransform,
) -> Option<CameraIntrinsics> {
    let origin = object_to_camera.transform_point(&Point3d::origin());
    if origin.z.abs() < CAMERA_PLANE_EPSILON {
        return None;
    }
    let uv = intrinsics.project(&origin)?;
    Some(intrinsics.with_principal_point(
        2.0 * intrinsics.cx - uv.x,
        2.0 * intrinsics.cy - uv.y,
    ))
}

impl TryFrom<PlanarGrid> for PlanarWorksurfaceDiscretizer {
    type Error = Error;

    fn try_from(grid: PlanarGrid) -> Result<Self> {
        Self::new(grid)
    }
}

impl From<PlanarWorksurfaceDiscretizer> for PlanarGrid {
    fn from(discretizer: PlanarWorksurfaceDiscretizer) -> Self {
        discretizer.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridRange, SphericalGrid};
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(CAMERA_FRAME, 525.0, 525.0, 319.5, 239.5, 640, 480).unwrap()
    }

    fn discretizer() -> PlanarWorksurfaceDiscretizer {
        let sphere = SphericalGrid::new(
            GridRange::new(0.6, 0.9, 2),
            GridRange::new(0.1, FRAC_PI_4, 3),
        )
            .with_azimuth(GridRange::full_turn(4))
            .with_roll(GridRange::new(0.0, PI, 2));
        let grid = PlanarGrid::new(sphere)
            .with_x(GridRange::new(-0.1, 0.1, 3))
            .with_y(GridRange::new(-0.05, 0.15, 2));
        PlanarWorksurfaceDiscretizer::new(grid).unwrap()
    }

    #[test]
    fn test_parallel_sequences() {
        let poses = discretizer().object_to_camera_poses(&intrinsics()).unwrap();
        assert_eq!(poses.len(), 2 * 3 * 4 * 2 * 3 * 2);
        assert_eq!(poses.normalized_poses.len(), poses.len());
        assert_eq!(poses.shifted_intrinsics.len(), poses.len());
    }

    #[test]
    fn test_recentered_intrinsics_center_the_object() {
        let k = intrinsics();
        let poses = discretizer().object_to_camera_poses(&k).unwrap();
        for (pose, shifted) in poses.object_to_camera_poses.iter().zip(&poses.shifted_intrinsics) {
            let origin = pose.transform_point(&Point3d::origin());
            let uv = shifted.project(&origin).unwrap();
            assert_relative_eq!(uv.x, k.cx, epsilon = 1e-6);
            assert_relative_eq!(uv.y, k.cy, epsilon = 1e-6);
            assert_eq!(shifted.fx, k.fx);
            assert_eq!(shifted.width, k.width);
        }
    }

    #[test]
    fn test_normalized_pose_removes_planar_offset() {
        let sphere = SphericalGrid::new(GridRange::single(0.7), GridRange::single(0.5));
        let grid = PlanarGrid::new(sphere)
            .with_x(GridRange::new(-0.1, 0.1, 2))
            .with_y(GridRange::new(0.0, 0.2, 2));
        let disc = PlanarWorksurfaceDiscretizer::new(grid).unwrap();
        let poses = disc.object_to_camera_poses(&intrinsics()).unwrap();
        let offsets = [(-0.1, 0.0), (-0.1, 0.2), (0.1, 0.0), (0.1, 0.2)];
        assert_eq!(poses.len(), offsets.len());

        for ((a, b), (x, y)) in poses
            .object_to_camera_poses
            .iter()
            .zip(&poses.normalized_poses)
            .zip(offsets)
        {
            let back = RigidTransform::from_translation(
                Vector3d::new(-x, -y, 0.0),
                OBJECT_FRAME,
                OBJECT_FRAME,
            );
            let reconstructed = back.dot(&a.inverse());
            assert!(reconstructed.approx_eq(&b.inverse(), 1e-9));
            assert_relative_eq!(a.rotation.matrix(), b.rotation.matrix(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_offset_keeps_principal_point() {
        let sphere = SphericalGrid::new(GridRange::single(1.0), GridRange::single(0.3));
        let grid = PlanarGrid::new(sphere);
        let k = intrinsics();
        let poses = PlanarWorksurfaceDiscretizer::new(grid)
            .unwrap()
            .object_to_camera_poses(&k)
            .unwrap();
        assert_eq!(poses.len(), 1);
        assert_relative_eq!(poses.shifted_intrinsics[0].cx, k.cx, epsilon = 1e-9);
        assert_relative_eq!(poses.shifted_intrinsics[0].cy, k.cy, epsilon = 1e-9);
        assert!(poses.object_to_camera_poses[0].approx_eq(&poses.normalized_poses[0], 1e-12));
    }

    #[test]
    fn test_offset_on_camera_plane_is_rejected() {
        // a camera on the +x equator shifted by -radius sits on the object origin
        let sphere = SphericalGrid::new(
            GridRange::single(1.0),
            GridRange::single(std::f64::consts::FRAC_PI_2),
        );
        let grid = PlanarGrid::new(sphere).with_x(GridRange::single(-1.0));
        let disc = PlanarWorksurfaceDiscretizer::new(grid).unwrap();
        assert!(matches!(
            disc.object_to_camera_poses(&intrinsics()),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
