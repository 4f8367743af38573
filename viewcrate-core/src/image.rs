//! Typed image containers produced by rendering
//!
//! Each container wraps an `ndarray` buffer in row-major `(row, col)` order
//! together with the frame of the camera that captured it:
//! - [`BinaryImage`]: `H x W` mask with values 0 or [`BINARY_FOREGROUND`]
//! - [`ColorImage`]: `H x W x 3` RGB buffer
//! - [`DepthImage`]: `H x W` metric depth, 0 where nothing was hit
//! - [`RgbdImage`]: a color and a depth image of identical size

use ndarray::{Array2, Array3, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Value of foreground pixels in a binary image
pub const BINARY_FOREGROUND: u8 = 255;

fn check_same_size(a: (usize, usize), b: (usize, usize)) -> Result<()> {
    if a != b {
        return Err(Error::InvalidData(format!(
            "image size mismatch: {}x{} vs {}x{}",
            a.1, a.0, b.1, b.0
        )));
    }
    Ok(())
}

/// Pixels where `other` should replace `base`: `base` is empty, or `other`
/// holds a valid depth nearer than `base`.
fn depth_replace_mask(base: &Array2<f32>, other: &Array2<f32>) -> Array2<bool> {
    Zip::from(base)
        .and(other)
        .map_collect(|&b, &o| b == 0.0 || (o != 0.0 && o < b))
}

/// A binary segmentation mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryImage {
    data: Array2<u8>,
    frame: String,
}

impl BinaryImage {
    /// Threshold a single channel: values strictly above `threshold` become foreground
    pub fn from_channel(channel: &Array2<u8>, threshold: u8, frame: impl Into<String>) -> Self {
        let data = channel.mapv(|v| if v > threshold { BINARY_FOREGROUND } else { 0 });
        Self {
            data,
            frame: frame.into(),
        }
    }

    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Number of foreground pixels
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// `(row, col)` of every background pixel
    pub fn zero_pixels(&self) -> Vec<(usize, usize)> {
        self.data
            .indexed_iter()
            .filter(|(_, v)| **v == 0)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Union of two masks
    pub fn combine_with(&self, other: &BinaryImage) -> Result<BinaryImage> {
        check_same_size(self.data.dim(), other.data.dim())?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| if a != 0 || b != 0 { BINARY_FOREGROUND } else { 0 });
        Ok(Self {
            data,
            frame: self.frame.clone(),
        })
    }
}

/// An RGB color image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorImage {
    data: Array3<u8>,
    frame: String,
}

impl ColorImage {
    /// Wrap an `H x W x 3` buffer
    pub fn new(data: Array3<u8>, frame: impl Into<String>) -> Result<Self> {
        if data.dim().2 != 3 {
            return Err(Error::InvalidData(format!(
                "color image needs 3 channels, got {}",
                data.dim().2
            )));
        }
        Ok(Self {
            data,
            frame: frame.into(),
        })
    }

    /// An all-black image
    pub fn zeros(height: usize, width: usize, frame: impl Into<String>) -> Self {
        Self {
            data: Array3::zeros((height, width, 3)),
            frame: frame.into(),
        }
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<u8> {
        &mut self.data
    }

    pub fn into_data(self) -> Array3<u8> {
        self.data
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// RGB value at `(row, col)`
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.data[[row, col, 0]],
            self.data[[row, col, 1]],
            self.data[[row, col, 2]],
        ]
    }

    /// `(row, col)` of every pixel whose channels are all zero
    pub fn zero_pixels(&self) -> Vec<(usize, usize)> {
        self.data
            .lanes(Axis(2))
            .into_iter()
            .enumerate()
            .filter(|(_, px)| px.iter().all(|&c| c == 0))
            .map(|(i, _)| (i / self.width(), i % self.width()))
            .collect()
    }

    /// Copy `other`'s pixels into this image at the given coordinates
    pub fn copy_pixels_from(
        &mut self,
        other: &ColorImage,
        pixels: &[(usize, usize)],
    ) -> Result<()> {
        check_same_size(
            (self.height(), self.width()),
            (other.height(), other.width()),
        )?;
        for &(r, c) in pixels {
            for ch in 0..3 {
                self.data[[r, c, ch]] = other.data[[r, c, ch]];
            }
        }
        Ok(())
    }

    /// Fill this image's zero pixels from `other`, leaving non-zero pixels untouched
    pub fn fill_background_from(&mut self, other: &ColorImage) -> Result<()> {
        let zero_px = self.zero_pixels();
        self.copy_pixels_from(other, &zero_px)
    }

    /// Background-fill combination: a new image with this image's zero
    /// pixels taken from `other`
    pub fn combine_with(&self, other: &ColorImage) -> Result<ColorImage> {
        let mut combined = self.clone();
        combined.fill_background_from(other)?;
        Ok(combined)
    }
}

/// A metric depth image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthImage {
    data: Array2<f32>,
    frame: String,
}

impl DepthImage {
    pub fn new(data: Array2<f32>, frame: impl Into<String>) -> Self {
        Self {
            data,
            frame: frame.into(),
        }
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// `(row, col)` of every pixel without depth
    pub fn zero_pixels(&self) -> Vec<(usize, usize)> {
        self.data
            .indexed_iter()
            .filter(|(_, d)| **d == 0.0)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Merge two depth images: empty pixels are filled from `other` and
    /// valid nearer depths in `other` replace this image's depths.
    pub fn combine_with(&self, other: &DepthImage) -> Result<DepthImage> {
        check_same_size(self.data.dim(), other.data.dim())?;
        let mask = depth_replace_mask(&self.data, &other.data);
        let data = Zip::from(&self.data)
            .and(&other.data)
            .and(&mask)
            .map_collect(|&a, &b, &take| if take { b } else { a });
        Ok(Self {
            data,
            frame: self.frame.clone(),
        })
    }

    /// Grey-scale visualisation: depth scaled by the maximum depth into 0..=255,
    /// replicated across the three channels. Empty pixels stay black.
    pub fn to_color(&self) -> ColorImage {
        let max_depth = self.data.iter().copied().fold(0.0_f32, f32::max);
        let scale = if max_depth > 0.0 { 255.0 / max_depth } else { 0.0 };
        let (h, w) = self.data.dim();
        let data = Array3::from_shape_fn((h, w, 3), |(r, c, _)| {
            (self.data[[r, c]] * scale).round().clamp(0.0, 255.0) as u8
        });
        ColorImage {
            data,
            frame: self.frame.clone(),
        }
    }
}

/// A color image paired with a depth image of the same size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbdImage {
    color: ColorImage,
    depth: DepthImage,
}

impl RgbdImage {
    /// Pair color and depth, which must have the same size
    pub fn from_color_and_depth(color: ColorImage, depth: DepthImage) -> Result<Self> {
        check_same_size((color.height(), color.width()), depth.data.dim())?;
        Ok(Self { color, depth })
    }

    pub fn color(&self) -> &ColorImage {
        &self.color
    }

    pub fn depth(&self) -> &DepthImage {
        &self.depth
    }

    pub fn frame(&self) -> &str {
        self.color.frame()
    }

    pub fn height(&self) -> usize {
        self.color.height()
    }

    pub fn width(&self) -> usize {
        self.color.width()
    }

    /// Merge with the depth rule of [`DepthImage::combine_with`]; color
    /// follows whichever depth wins.
    pub fn combine_with(&self, other: &RgbdImage) -> Result<RgbdImage> {
        check_same_size(self.depth.data.dim(), other.depth.data.dim())?;
        let mask = depth_replace_mask(&self.depth.data, &other.depth.data);
        let pixels: Vec<(usize, usize)> = mask
            .indexed_iter()
            .filter(|(_, take)| **take)
            .map(|(idx, _)| idx)
            .collect();

        let mut color = self.color.clone();
        color.copy_pixels_from(&other.color, &pixels)?;
        let depth = self.depth.combine_with(&other.depth)?;
        Ok(Self { color, depth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_threshold_is_strict() {
        let channel = array![[0u8, 1], [0, 200]];
        let mask = BinaryImage::from_channel(&channel, 0, "camera");
        assert_eq!(mask.data(), &array![[0u8, 255], [0, 255]]);
        assert_eq!(mask.nonzero_count(), 2);
        assert_eq!(mask.zero_pixels(), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_color_zero_pixels_and_background_fill() {
        let mut primary = ColorImage::zeros(2, 3, "camera");
        primary.data_mut()[[0, 1, 2]] = 9;
        primary.data_mut()[[1, 2, 0]] = 4;
        assert_eq!(primary.zero_pixels(), vec![(0, 0), (0, 2), (1, 0), (1, 1)]);

        let other = ColorImage::new(Array3::from_elem((2, 3, 3), 100u8), "camera").unwrap();
        let combined = primary.combine_with(&other).unwrap();
        assert_eq!(combined.pixel(0, 0), [100, 100, 100]);
        assert_eq!(combined.pixel(0, 1), [0, 0, 9]);
        assert_eq!(combined.pixel(1, 2), [4, 0, 0]);
    }

    #[test]
    fn test_color_requires_three_channels() {
        assert!(ColorImage::new(Array3::zeros((2, 2, 4)), "camera").is_err());
    }

    #[test]
    fn test_depth_combine_nearer_valid_wins() {
        let a = DepthImage::new(array![[0.0f32, 2.0], [1.0, 1.0]], "camera");
        let b = DepthImage::new(array![[3.0f32, 1.5], [0.0, 4.0]], "camera");
        let merged = a.combine_with(&b).unwrap();
        assert_eq!(merged.data(), &array![[3.0f32, 1.5], [1.0, 1.0]]);
    }

    #[test]
    fn test_depth_combine_size_mismatch() {
        let a = DepthImage::new(Array2::zeros((2, 2)), "camera");
        let b = DepthImage::new(Array2::zeros((3, 2)), "camera");
        assert!(matches!(a.combine_with(&b), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_depth_to_color_scales_by_max() {
        let d = DepthImage::new(array![[0.0f32, 1.0], [2.0, 4.0]], "camera");
        let c = d.to_color();
        assert_eq!(c.pixel(0, 0), [0, 0, 0]);
        assert_eq!(c.pixel(1, 1), [255, 255, 255]);
        assert_eq!(c.pixel(1, 0), [128, 128, 128]);
    }

    #[test]
    fn test_rgbd_color_follows_depth() {
        let mut c1 = ColorImage::zeros(1, 2, "camera");
        c1.data_mut()[[0, 0, 0]] = 10;
        c1.data_mut()[[0, 1, 0]] = 10;
        let d1 = DepthImage::new(array![[1.0f32, 1.0]], "camera");
        let c2 = ColorImage::new(Array3::from_elem((1, 2, 3), 50u8), "camera").unwrap();
        let d2 = DepthImage::new(array![[0.5f32, 2.0]], "camera");

        let a = RgbdImage::from_color_and_depth(c1, d1).unwrap();
        let b = RgbdImage::from_color_and_depth(c2, d2).unwrap();
        let merged = a.combine_with(&b).unwrap();
        assert_eq!(merged.color().pixel(0, 0), [50, 50, 50]);
        assert_eq!(merged.color().pixel(0, 1), [10, 0, 0]);
        assert_eq!(merged.depth().data(), &array![[0.5f32, 1.0]]);
    }
}
