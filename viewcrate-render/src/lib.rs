//! # Viewcrate Render
//!
//! Camera-pose discretization and virtual-camera rendering.
//!
//! This crate samples camera poses around an object (on a viewing sphere or
//! over a planar worksurface) and renders the object from those poses into
//! segmentation masks, color, depth and RGB-D images. Rasterization sits
//! behind the [`Rasterizer`] trait; [`SoftwareRasterizer`] is the CPU
//! implementation.

pub mod grid;
pub mod viewsphere;
pub mod planar;
pub mod properties;
pub mod render_mode;
pub mod rasterizer;
pub mod software;
pub mod camera;

// Re-export commonly used items
pub use grid::*;
pub use viewsphere::*;
pub use planar::*;
pub use properties::*;
pub use render_mode::*;
pub use rasterizer::*;
pub use software::*;
pub use camera::*;
