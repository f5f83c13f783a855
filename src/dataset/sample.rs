//! Sample preprocessing
//!
//! Normalizes a slice into the fixed tensor shape and value range the
//! classifier expects: single-channel grayscale, 28x28, intensities scaled
//! from `[0, 255]` to `[0.0, 1.0]`. Training and inference both call
//! [`preprocess`]; the shared function is what keeps the two paths identical.

use image::imageops::{self, FilterType};
use image::DynamicImage;

use super::slicer::Slice;
use crate::SAMPLE_SIZE;

/// A labeled, preprocessed slice ready for batching
#[derive(Debug, Clone)]
pub struct SliceSample {
    /// Normalized pixel buffer, `[1, 28, 28]` flattened row-major
    pub image: Vec<f32>,
    /// Ground-truth digit in `[0, 9]`
    pub label: usize,
    /// Slice save name (for logging)
    pub name: String,
}

impl SliceSample {
    /// Build a training sample from a slice and its ground-truth digit
    pub fn from_slice(slice: &Slice, digit: u8) -> Self {
        Self {
            image: preprocess(&slice.image),
            label: digit as usize,
            name: slice.file_name.clone(),
        }
    }
}

/// Normalize an image into the classifier's input buffer.
///
/// Grayscale, resized to 28x28 with bilinear (Triangle) resampling, scaled to
/// `[0.0, 1.0]`, row-major.
pub fn preprocess(image: &DynamicImage) -> Vec<f32> {
    let gray = image.to_luma8();
    let resized = imageops::resize(
        &gray,
        SAMPLE_SIZE as u32,
        SAMPLE_SIZE as u32,
        FilterType::Triangle,
    );

    resized.pixels().map(|p| p[0] as f32 / 255.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape_and_range() {
        for (width, height) in [(15u32, 30u32), (16, 30), (100, 100), (1, 1)] {
            let image = DynamicImage::new_rgb8(width, height);
            let buffer = preprocess(&image);

            assert_eq!(buffer.len(), SAMPLE_SIZE * SAMPLE_SIZE);
            assert!(buffer.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_preprocess_scales_intensities() {
        let mut rgb = image::RgbImage::new(10, 10);
        for pixel in rgb.pixels_mut() {
            *pixel = image::Rgb([255, 255, 255]);
        }
        let buffer = preprocess(&DynamicImage::ImageRgb8(rgb));

        assert!(buffer.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let image = DynamicImage::new_rgb8(40, 25);
        assert_eq!(preprocess(&image), preprocess(&image));
    }
}
