//! Single-image reading pipeline
//!
//! Load -> slice -> preprocess -> predict -> aggregate. Both fatal
//! preconditions (model artifact, test image) are checked before any slicing
//! occurs; a missing one aborts with no partial output. Slice order is the
//! geometric left-to-right order from the slicer and is never re-sorted.

use std::path::{Path, PathBuf};

use burn::tensor::backend::Backend;
use tracing::info;

use super::predictor::{Predictor, ReadingResult};
use crate::dataset::batcher::stack_slices;
use crate::dataset::labels::SourceName;
use crate::dataset::sample::preprocess;
use crate::dataset::slicer::{persist_slices, slice_image, SliceSpec};
use crate::utils::error::{DigitstripError, Result};

/// Configuration for the reading pipeline
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Model artifact path (recorder extension added on load)
    pub model_path: PathBuf,
    /// Folder for the persisted slice files
    pub slice_dir: PathBuf,
    /// Crop geometry
    pub spec: SliceSpec,
}

impl ReaderConfig {
    /// Create a reader configuration with default geometry
    pub fn new(model_path: impl Into<PathBuf>, slice_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            slice_dir: slice_dir.into(),
            spec: SliceSpec::default(),
        }
    }
}

/// Read the number from a single source image with a trained model.
///
/// Returns the predicted digit string with per-slice confidences. The slices
/// are persisted to the configured folder, mirroring the training pipeline.
pub fn read_number<B: Backend>(
    image_path: &Path,
    config: &ReaderConfig,
    device: &B::Device,
) -> Result<ReadingResult> {
    // Fatal preconditions, checked before any slicing.
    let predictor = Predictor::<B>::from_artifact(&config.model_path, device.clone())?;
    if !image_path.exists() {
        return Err(DigitstripError::MissingSource(image_path.to_path_buf()));
    }

    let image = image::open(image_path)
        .map_err(|e| DigitstripError::ImageLoad(image_path.to_path_buf(), e.to_string()))?;

    let file_name = image_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let name =
        SourceName::parse(file_name).unwrap_or_else(|_| SourceName::fallback(file_name));

    let slices = slice_image(&image, &config.spec, &name)?;
    persist_slices(&slices, &config.slice_dir)?;
    info!("Image split into {} slices", slices.len());

    let buffers: Vec<Vec<f32>> = slices.iter().map(|s| preprocess(&s.image)).collect();
    let images = stack_slices::<B>(&buffers, device);

    let digits = predictor.predict(images);
    let number: String = digits.iter().map(|p| char::from(b'0' + p.digit)).collect();

    Ok(ReadingResult {
        image_path: image_path.to_path_buf(),
        number,
        digits,
    })
}
