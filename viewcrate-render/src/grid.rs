//! Parametric grids over spherical and planar camera coordinates

use std::f64::consts::TAU;

use nalgebra::{Matrix3, Rotation3};
use serde::{Deserialize, Serialize};
use viewcrate_core::{sph2cart, Error, Point3d, Result, Vector3d};

/// A sampled interval `(min, max, count)` along one grid dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl GridRange {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self { min, max, count }
    }

    /// A range holding exactly one value
    pub fn single(value: f64) -> Self {
        Self::new(value, value, 1)
    }

    /// `count` samples over a full revolution `[0, 2π)`
    pub fn full_turn(count: usize) -> Self {
        Self::new(0.0, TAU, count)
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        if self.count < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "discretization must be at least one in each dimension, {} has {}",
                name, self.count
            )));
        }
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(Error::InvalidConfiguration(format!(
                "{} bounds must be finite, got [{}, {}]",
                name, self.min, self.max
            )));
        }
        Ok(())
    }

    /// Increment between samples of a closed range.
    ///
    /// A degenerate range (`min == max`) uses a unit step so only `min`
    /// is visited; a single-sample range steps past `max` for the same reason.
    pub fn closed_step(&self) -> f64 {
        if self.max == self.min {
            1.0
        } else if self.count == 1 {
            self.max - self.min + 1.0
        } else {
            (self.max - self.min) / (self.count - 1) as f64
        }
    }

    /// Increment between samples of a periodic range
    pub fn periodic_step(&self) -> f64 {
        (self.max - self.min) / self.count as f64
    }

    /// Samples of the closed interval `[min, max]`
    pub fn closed_samples(&self) -> Vec<f64> {
        let step = self.closed_step();
        // absorbs rounding on the last sample so `max` itself is kept
        let slack = 1e-9 * (self.max - self.min).abs().max(1.0);
        (0..self.count)
            .map(|i| self.min + i as f64 * step)
            .take_while(|v| *v <= self.max + slack)
            .collect()
    }

    /// Samples of the half-open interval `[min, max)`; `max` is the seam of
    /// a full revolution and is never produced.
    pub fn periodic_samples(&self) -> Vec<f64> {
        let step = self.periodic_step();
        (0..self.count)
            .map(|i| self.min + i as f64 * step)
            .take_while(|v| *v < self.max)
            .collect()
    }
}

fn default_periodic() -> GridRange {
    GridRange::full_turn(1)
}

fn default_planar() -> GridRange {
    GridRange::new(0.0, 1.0, 1)
}

/// Grid over radius, elevation, azimuth and roll of a camera on a viewsphere.
///
/// Elevation is measured from the object's +z axis and azimuth from its +x
/// axis. Radius and elevation are closed intervals; azimuth and roll are
/// periodic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphericalGrid {
    pub radius: GridRange,
    pub elevation: GridRange,
    #[serde(default = "default_periodic")]
    pub azimuth: GridRange,
    #[serde(default = "default_periodic")]
    pub roll: GridRange,
}

impl SphericalGrid {
    /// Grid with a single azimuth and roll of zero
    pub fn new(radius: GridRange, elevation: GridRange) -> Self {
        Self {
            radius,
            elevation,
            azimuth: default_periodic(),
            roll: default_periodic(),
        }
    }

    pub fn with_azimuth(mut self, azimuth: GridRange) -> Self {
        self.azimuth = azimuth;
        self
    }

    pub fn with_roll(mut self, roll: GridRange) -> Self {
        self.roll = roll;
        self
    }

    /// Check every dimension has at least one sample and that no sampled
    /// camera center coincides with the object origin. Negative radii are
    /// allowed and mirror the camera through the origin.
    pub fn validate(&self) -> Result<()> {
        self.radius.validate("radius")?;
        self.elevation.validate("elevation")?;
        self.azimuth.validate("azimuth")?;
        self.roll.validate("roll")?;
        if self.radius.closed_samples().contains(&0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "viewsphere radius samples [{}, {}] include zero",
                self.radius.min, self.radius.max
            )));
        }
        Ok(())
    }
}

/// A [`SphericalGrid`] extended with planar offsets of the camera along the
/// object's x and y axes. Both offsets are closed intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarGrid {
    #[serde(flatten)]
    pub sphere: SphericalGrid,
    #[serde(default = "default_planar")]
    pub x: GridRange,
    #[serde(default = "default_planar")]
    pub y: GridRange,
}

impl PlanarGrid {
    /// Planar grid with a single zero offset
    pub fn new(sphere: SphericalGrid) -> Self {
        Self {
            sphere,
            x: GridRange::single(0.0),
            y: GridRange::single(0.0),
        }
    }

    pub fn with_x(mut self, x: GridRange) -> Self {
        self.x = x;
        self
    }

    pub fn with_y(mut self, y: GridRange) -> Self {
        self.y = y;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.sphere.validate()?;
        self.x.validate("x")?;
        self.y.validate("y")?;
        Ok(())
    }
}

/// Orientation of a camera sitting at `center` and looking at the object origin.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CameraFrame {
    /// Camera frame to object frame rotation, roll included
    pub rotation: Rotation3<f64>,
    /// Whether the canonical x axis was negated to keep the camera upright
    pub flipped: bool,
}

impl CameraFrame {
    /// Canonical frame for a camera at `center` with `roll` about its viewing axis.
    ///
    /// `center` must be non-zero.
    pub fn looking_at_origin(center: &Point3d, roll: f64) -> Self {
        let z = -center.coords.normalize();

        let mut x = Vector3d::new(z.y, -z.x, 0.0);
        if x.norm() == 0.0 {
            // viewing axis is the polar axis
            x = Vector3d::x();
        }
        x.normalize_mut();
        let mut y = z.cross(&x).normalize();

        let flipped = y.z > 0.0;
        if flipped {
            x = -x;
            y = z.cross(&x).normalize();
        }

        let canonical = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        let roll = Rotation3::from_axis_angle(&Vector3d::z_axis(), roll);
        Self {
            rotation: canonical * roll,
            flipped,
        }
    }
}

/// Camera center on the viewsphere for the given spherical coordinates
pub(crate) fn sphere_center(radius: f64, elevation: f64, azimuth: f64) -> Point3d {
    sph2cart(radius, azimuth, elevation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_closed_samples_include_both_ends() {
        let r = GridRange::new(0.1, 0.7, 4);
        let samples = r.closed_samples();
        assert_eq!(samples.len(), 4);
        assert_relative_eq!(samples[0], 0.1);
        assert_relative_eq!(samples[3], 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_closed_range_visits_once() {
        assert_eq!(GridRange::new(2.0, 2.0, 5).closed_samples(), vec![2.0]);
        assert_eq!(GridRange::new(2.0, 2.0, 5).closed_step(), 1.0);
        assert_eq!(GridRange::new(1.0, 3.0, 1).closed_samples(), vec![1.0]);
        assert!(GridRange::new(3.0, 1.0, 2).closed_samples().is_empty());
    }

    #[test]
    fn test_periodic_samples_skip_seam() {
        let samples = GridRange::full_turn(4).periodic_samples();
        assert_eq!(samples.len(), 4);
        for (s, expected) in samples.iter().zip([0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2]) {
            assert_relative_eq!(*s, expected, epsilon = 1e-12);
        }
        assert!(samples.iter().all(|&s| s < TAU));
        assert!(GridRange::new(1.0, 1.0, 3).periodic_samples().is_empty());
    }

    #[test]
    fn test_validation_rejects_empty_dimension() {
        let grid = SphericalGrid::new(GridRange::single(1.0), GridRange::new(0.0, 1.0, 0));
        assert!(matches!(grid.validate(), Err(Error::InvalidConfiguration(_))));

        let grid = SphericalGrid::new(GridRange::single(1.0), GridRange::single(0.0))
            .with_roll(GridRange::full_turn(0));
        assert!(grid.validate().is_err());

        let sphere = SphericalGrid::new(GridRange::single(1.0), GridRange::single(0.0));
        let planar = PlanarGrid::new(sphere).with_y(GridRange::new(0.0, 1.0, 0));
        assert!(planar.validate().is_err());

        let grid = SphericalGrid::new(GridRange::single(0.0), GridRange::single(0.0));
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_only_zero_radius_samples_are_rejected() {
        // a negative radius places the camera on the opposite side of the sphere
        let grid = SphericalGrid::new(GridRange::single(-0.5), GridRange::single(0.3));
        assert!(grid.validate().is_ok());
        let center = sphere_center(-0.5, 0.3, 0.0);
        let frame = CameraFrame::looking_at_origin(&center, 0.0);
        let z = frame.rotation.matrix().column(2).into_owned();
        assert_relative_eq!(z, -center.coords.normalize(), epsilon = 1e-9);

        let crossing = SphericalGrid::new(GridRange::new(-1.0, 1.0, 3), GridRange::single(0.3));
        assert!(matches!(crossing.validate(), Err(Error::InvalidConfiguration(_))));
        let skipping = SphericalGrid::new(GridRange::new(-1.0, 1.0, 2), GridRange::single(0.3));
        assert!(skipping.validate().is_ok());
    }

    #[test]
    fn test_camera_frame_points_at_origin_and_stays_upright() {
        for &(elev, az) in &[(0.0, 0.0), (0.3, 1.0), (FRAC_PI_2, 2.5), (PI - 0.2, 4.0), (PI, 0.0)] {
            let center = sphere_center(1.5, elev, az);
            let frame = CameraFrame::looking_at_origin(&center, 0.0);
            let z = frame.rotation.matrix().column(2).into_owned();
            let y = frame.rotation.matrix().column(1).into_owned();
            assert_relative_eq!(z, -center.coords.normalize(), epsilon = 1e-9);
            assert!(y.z <= 1e-12);
            assert_relative_eq!(frame.rotation.matrix().determinant(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_roll_rotates_about_viewing_axis() {
        let center = sphere_center(1.0, 0.8, 0.4);
        let base = CameraFrame::looking_at_origin(&center, 0.0);
        let rolled = CameraFrame::looking_at_origin(&center, FRAC_PI_2);
        let bz = base.rotation.matrix().column(2).into_owned();
        let rz = rolled.rotation.matrix().column(2).into_owned();
        assert_relative_eq!(bz, rz, epsilon = 1e-12);
        let by = base.rotation.matrix().column(1).into_owned();
        let rx = rolled.rotation.matrix().column(0).into_owned();
        assert_relative_eq!(rx, by, epsilon = 1e-12);
    }

    #[test]
    fn test_planar_grid_deserializes_with_defaults() {
        let json = r#"{
            "radius": {"min": 0.5, "max": 0.5, "count": 1},
            "elevation": {"min": 0.1, "max": 0.1, "count": 1}
        }"#;
        let grid: PlanarGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.sphere.azimuth, GridRange::full_turn(1));
        assert_eq!(grid.x, GridRange::new(0.0, 1.0, 1));
        assert!(grid.validate().is_ok());
    }
}
