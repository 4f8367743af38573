//! Camera poses sampled over a viewing sphere

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use viewcrate_core::{RigidTransform, Result, CAMERA_FRAME, OBJECT_FRAME};

use crate::grid::{sphere_center, CameraFrame, SphericalGrid};

/// Virtual cameras placed around a viewing sphere centered on the object.
///
/// Poses are generated radius-major, then elevation, azimuth and roll.
/// Every camera looks at the object origin with its image "up" direction
/// kept against world +z, then rolled about its viewing axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SphericalGrid", into = "SphericalGrid")]
pub struct ViewsphereDiscretizer {
    grid: SphericalGrid,
}

impl ViewsphereDiscretizer {
    /// Create a discretizer, failing if any dimension has no samples
    pub fn new(grid: SphericalGrid) -> Result<Self> {
        grid.validate()?;
        Ok(Self { grid })
    }

    pub fn grid(&self) -> &SphericalGrid {
        &self.grid
    }

    /// Object-to-camera transforms for every grid point
    pub fn object_to_camera_poses(&self) -> Vec<RigidTransform> {
        let radii = self.grid.radius.closed_samples();
        let elevations = self.grid.elevation.closed_samples();
        let azimuths = self.grid.azimuth.periodic_samples();
        let rolls = self.grid.roll.periodic_samples();

        iproduct!(radii.iter(), elevations.iter(), azimuths.iter(), rolls.iter())
            .enumerate()
            .map(|(i, (&radius, &elevation, &azimuth, &roll))| {
                let center = sphere_center(radius, elevation, azimuth);
                let frame = CameraFrame::looking_at_origin(&center, roll);
                if frame.flipped {
                    log::trace!("Flipping camera x axis for pose {}", i);
                }
                RigidTransform::new(frame.rotation, center.coords, CAMERA_FRAME, OBJECT_FRAME)
                    .inverse()
            })
            .collect()
    }
}

impl TryFrom<SphericalGrid> for ViewsphereDiscretizer {
    type Error = viewcrate_core::Error;

    fn try_from(grid: SphericalGrid) -> Result<Self> {
        Self::new(grid)
    }
}

impl From<ViewsphereDiscretizer> for SphericalGrid {
    fn from(discretizer: ViewsphereDiscretizer) -> Self {
        discretizer.grid
    }
}
