//! Fixed-geometry image slicer
//!
//! Splits a source image into N contiguous vertical bands covering
//! `[start, end)` at full image height, one band per digit cell. The compute
//! step is pure; persisting the slices to disk is a separate, explicit step
//! so slicing can be tested without filesystem access.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::labels::SourceName;
use crate::utils::error::{DigitstripError, Result};

/// Immutable crop geometry, fixed per deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSpec {
    /// Horizontal crop start offset in pixels
    pub start: u32,
    /// Horizontal crop end offset in pixels (exclusive)
    pub end: u32,
    /// Number of digit cells
    pub num_slices: usize,
}

impl Default for SliceSpec {
    fn default() -> Self {
        Self {
            start: 7,
            end: 83,
            num_slices: 5,
        }
    }
}

impl SliceSpec {
    /// Create a new slice geometry
    pub fn new(start: u32, end: u32, num_slices: usize) -> Self {
        Self {
            start,
            end,
            num_slices,
        }
    }

    /// Check internal consistency: a non-empty crop window and at least one slice
    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(DigitstripError::InvalidGeometry(format!(
                "crop end {} must be greater than crop start {}",
                self.end, self.start
            )));
        }
        if self.num_slices == 0 {
            return Err(DigitstripError::InvalidGeometry(
                "slice count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Width of every slice but the last (integer division)
    pub fn slice_width(&self) -> u32 {
        (self.end - self.start) / self.num_slices as u32
    }

    /// The ordered band plan: contiguous, left-to-right, covering
    /// `[start, end)` exactly. The last band's right edge is pinned to `end`
    /// and absorbs the integer-division remainder.
    pub fn bands(&self) -> Vec<SliceBand> {
        let width = self.slice_width();
        (0..self.num_slices)
            .map(|index| {
                let left = self.start + index as u32 * width;
                let right = if index == self.num_slices - 1 {
                    self.end
                } else {
                    left + width
                };
                SliceBand { index, left, right }
            })
            .collect()
    }
}

/// One vertical band of the crop window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBand {
    pub index: usize,
    pub left: u32,
    pub right: u32,
}

impl SliceBand {
    /// Band width in pixels
    pub fn width(&self) -> u32 {
        self.right - self.left
    }
}

/// One digit cell cropped from a source image
///
/// Derived data: independent of the source image after creation. The save
/// name encodes the slice index, the source stamp, and the label suffix.
#[derive(Debug, Clone)]
pub struct Slice {
    pub index: usize,
    pub file_name: String,
    pub image: DynamicImage,
}

/// Crop a source image into its ordered digit cells (pure, no filesystem).
///
/// Crop bounds exceeding the image width are a checked precondition, not a
/// silent truncation.
pub fn slice_image(
    image: &DynamicImage,
    spec: &SliceSpec,
    name: &SourceName,
) -> Result<Vec<Slice>> {
    spec.validate()?;
    if spec.end > image.width() {
        return Err(DigitstripError::GeometryOutOfBounds {
            end: spec.end,
            width: image.width(),
        });
    }

    let height = image.height();
    let slices = spec
        .bands()
        .into_iter()
        .map(|band| Slice {
            index: band.index,
            file_name: name.slice_file_name(band.index),
            image: image.crop_imm(band.left, 0, band.width(), height),
        })
        .collect();

    Ok(slices)
}

/// Persist slices as individual JPEG files under `out_dir` (created if absent).
///
/// Returns the written paths in slice order.
pub fn persist_slices(slices: &[Slice], out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    slices
        .iter()
        .map(|slice| {
            let path = out_dir.join(&slice.file_name);
            slice
                .image
                .to_rgb8()
                .save(&path)
                .map_err(|e| DigitstripError::SliceWrite(path.clone(), e.to_string()))?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> SourceName {
        SourceName::parse("20250219_082720_97919.jpg").unwrap()
    }

    #[test]
    fn test_default_geometry_widths() {
        let spec = SliceSpec::default();
        let widths: Vec<u32> = spec.bands().iter().map(|b| b.width()).collect();
        assert_eq!(widths, vec![15, 15, 15, 15, 16]);
    }

    #[test]
    fn test_bands_cover_window_exactly() {
        for (start, end, num_slices) in [(7u32, 83u32, 5usize), (0, 100, 7), (3, 10, 1), (5, 6, 1)]
        {
            let spec = SliceSpec::new(start, end, num_slices);
            let bands = spec.bands();

            assert_eq!(bands.len(), num_slices);
            assert_eq!(bands[0].left, start);
            assert_eq!(bands[num_slices - 1].right, end);

            for pair in bands.windows(2) {
                assert_eq!(pair[0].right, pair[1].left);
                assert!(pair[0].index + 1 == pair[1].index);
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        assert!(SliceSpec::new(10, 10, 5).validate().is_err());
        assert!(SliceSpec::new(20, 10, 5).validate().is_err());
        assert!(SliceSpec::new(0, 10, 0).validate().is_err());
    }

    #[test]
    fn test_slice_image_dimensions_and_names() {
        let image = DynamicImage::new_rgb8(100, 30);
        let slices = slice_image(&image, &SliceSpec::default(), &name()).unwrap();

        assert_eq!(slices.len(), 5);
        for (i, slice) in slices.iter().enumerate() {
            assert_eq!(slice.index, i);
            assert_eq!(slice.image.height(), 30);
        }
        assert_eq!(slices[0].image.width(), 15);
        assert_eq!(slices[4].image.width(), 16);
        assert_eq!(slices[0].file_name, "0_20250219_082720_9.jpg");
        assert_eq!(slices[3].file_name, "3_20250219_082720_1.jpg");
    }

    #[test]
    fn test_slice_image_checks_bounds() {
        let image = DynamicImage::new_rgb8(60, 30);
        let result = slice_image(&image, &SliceSpec::default(), &name());
        assert!(matches!(
            result,
            Err(DigitstripError::GeometryOutOfBounds { end: 83, width: 60 })
        ));
    }

    #[test]
    fn test_slice_image_is_deterministic() {
        let image = DynamicImage::new_rgb8(100, 30);
        let first = slice_image(&image, &SliceSpec::default(), &name()).unwrap();
        let second = slice_image(&image, &SliceSpec::default(), &name()).unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.file_name, b.file_name);
            assert_eq!(a.image.as_bytes(), b.image.as_bytes());
        }
    }

    #[test]
    fn test_persist_slices_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("slices");

        let image = DynamicImage::new_rgb8(100, 30);
        let slices = slice_image(&image, &SliceSpec::default(), &name()).unwrap();
        let paths = persist_slices(&slices, &out_dir).unwrap();

        assert_eq!(paths.len(), 5);
        for path in &paths {
            assert!(path.exists());
        }
        assert_eq!(
            paths[0].file_name().unwrap().to_str().unwrap(),
            "0_20250219_082720_9.jpg"
        );
    }
}
