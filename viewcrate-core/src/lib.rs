//! Core data structures for viewcrate
//! 
//! This crate provides the value types shared by the viewpoint discretizers
//! and the virtual camera: rigid transforms between named frames, pinhole
//! camera intrinsics, triangle meshes, stable poses and the typed image
//! containers produced by rendering.

pub mod point;
pub mod mesh;
pub mod transform;
pub mod intrinsics;
pub mod stable_pose;
pub mod image;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use transform::*;
pub use intrinsics::*;
pub use stable_pose::*;
pub use image::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector3, Matrix3, Matrix3x4, Matrix4, Rotation3};
