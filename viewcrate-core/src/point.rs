//! Point and vector aliases

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates, used for mesh vertices
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates, used for pose algebra
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Convert spherical coordinates to a Cartesian point.
///
/// Elevation is the angle from the +z axis and azimuth the angle from the +x axis.
pub fn sph2cart(radius: f64, azimuth: f64, elevation: f64) -> Point3d {
    Point3d::new(
        radius * azimuth.cos() * elevation.sin(),
        radius * azimuth.sin() * elevation.sin(),
        radius * elevation.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sph2cart_pole_and_equator() {
        let pole = sph2cart(2.0, 1.3, 0.0);
        assert_relative_eq!(pole, Point3d::new(0.0, 0.0, 2.0), epsilon = 1e-12);

        let equator = sph2cart(1.0, std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(equator, Point3d::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
