//! The rasterization backend seam

use nalgebra::Matrix3x4;
use ndarray::{Array2, Array3};
use viewcrate_core::{Point3f, Result, Vector3f};

/// Everything a backend needs to rasterize one mesh from a set of cameras
#[derive(Debug, Clone, Copy)]
pub struct RasterJob<'a> {
    /// `K [R | t]` for each camera, object frame to homogeneous pixels
    pub projection_matrices: &'a [Matrix3x4<f64>],
    pub height: usize,
    pub width: usize,
    pub vertices: &'a [Point3f],
    pub triangles: &'a [[usize; 3]],
    pub normals: &'a [Vector3f],
    /// See [`MaterialProperties::to_params`](crate::MaterialProperties::to_params)
    pub material_params: &'a [f32],
    /// See [`LightingProperties::to_params`](crate::LightingProperties::to_params)
    pub light_params: &'a [f32],
    pub enable_lighting: bool,
    pub debug: bool,
}

/// Raw buffers returned by a backend, one pair per projection matrix and in
/// the same order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawImages {
    /// `H x W x 3` color buffers
    pub color: Vec<Array3<u8>>,
    /// `H x W` depth buffers, 0 where no surface was hit
    pub depth: Vec<Array2<f32>>,
}

impl RawImages {
    pub fn len(&self) -> usize {
        self.color.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_empty()
    }

    /// Append another batch, keeping order
    pub fn extend(&mut self, other: RawImages) {
        self.color.extend(other.color);
        self.depth.extend(other.depth);
    }
}

/// Turns geometry, cameras and shading parameters into color and depth buffers.
///
/// Implementations must return exactly one color and one depth buffer per
/// projection matrix, in input order. Any failure aborts the whole render.
pub trait Rasterizer {
    fn render(&self, job: &RasterJob<'_>) -> Result<RawImages>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn render(&self, job: &RasterJob<'_>) -> Result<RawImages> {
        (**self).render(job)
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn render(&self, job: &RasterJob<'_>) -> Result<RawImages> {
        (**self).render(job)
    }
}
