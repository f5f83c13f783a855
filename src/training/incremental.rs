//! Incremental training orchestrator
//!
//! Drives the per-image pipeline over a source folder:
//! load -> slice -> label and preprocess -> train step -> advance, then one
//! persist action after the last image. Per-image failures are isolated and
//! logged; they never abort the loop. The running totals are an explicit
//! accumulator threaded through the loop, not ambient state.

use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::tensor::backend::AutodiffBackend;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::trainer::{StepOutcome, Trainer};
use super::TrainingConfig;
use crate::dataset::batcher::SliceBatcher;
use crate::dataset::labels::{LabelManifest, SliceLabel, SourceName};
use crate::dataset::sample::SliceSample;
use crate::dataset::slicer::{persist_slices, slice_image, SliceSpec};
use crate::dataset::scan_source_images;
use crate::model::artifact_file;
use crate::model::cnn::DigitClassifierConfig;
use crate::utils::error::{DigitstripError, Result};
use crate::utils::metrics::ConfusionMatrix;
use crate::NUM_CLASSES;

/// Configuration for one incremental training run
#[derive(Debug, Clone)]
pub struct IncrementalRunConfig {
    /// Folder of source images
    pub input_dir: PathBuf,
    /// Folder for the persisted slice files
    pub slice_dir: PathBuf,
    /// Model artifact path (recorder extension added on save)
    pub model_path: PathBuf,
    /// Optional JSON label manifest overriding filename digit strings
    pub manifest_path: Option<PathBuf>,
    /// Crop geometry
    pub spec: SliceSpec,
    /// Training hyperparameters
    pub training: TrainingConfig,
}

impl IncrementalRunConfig {
    /// Create a run configuration with default geometry and hyperparameters
    pub fn new(
        input_dir: impl Into<PathBuf>,
        slice_dir: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            slice_dir: slice_dir.into(),
            model_path: model_path.into(),
            manifest_path: None,
            spec: SliceSpec::default(),
            training: TrainingConfig::default(),
        }
    }
}

/// Accumulator threaded through the training loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTotals {
    /// Source images visited
    pub images_seen: usize,
    /// Images that contributed a training step
    pub images_trained: usize,
    /// Images skipped (load/geometry failures or empty batches)
    pub images_skipped: usize,
    /// Labeled samples trained so far; never decreases
    pub samples_trained: usize,
}

impl RunningTotals {
    /// Totals after an image contributed `samples` to a training step
    pub fn absorb_trained(self, samples: usize) -> Self {
        Self {
            images_seen: self.images_seen + 1,
            images_trained: self.images_trained + 1,
            samples_trained: self.samples_trained + samples,
            ..self
        }
    }

    /// Totals after an image was skipped
    pub fn absorb_skipped(self) -> Self {
        Self {
            images_seen: self.images_seen + 1,
            images_skipped: self.images_skipped + 1,
            ..self
        }
    }
}

/// Summary of a completed training run, persisted as JSON beside the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub totals: RunningTotals,
    /// Mean per-step loss across all training steps
    pub mean_loss: f64,
    /// Accuracy of pre-update predictions across the run
    pub train_accuracy: f64,
    pub started_at: String,
    pub finished_at: String,
    pub model_artifact: PathBuf,
}

impl TrainReport {
    /// Write the report as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DigitstripError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Report path derived from the model artifact path
    pub fn path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("report.json")
    }
}

/// Train the classifier incrementally over a folder of source images.
///
/// One training step per image, on the batch of labeled slices derived from
/// that image alone. The trained model is persisted once, after the last
/// image, together with a JSON report.
pub fn run_incremental_training<B: AutodiffBackend>(
    config: &IncrementalRunConfig,
    device: &B::Device,
) -> Result<TrainReport> {
    let started_at = Utc::now().to_rfc3339();

    let manifest = match &config.manifest_path {
        Some(path) => {
            if !path.exists() {
                return Err(DigitstripError::MissingSource(path.clone()));
            }
            let manifest = LabelManifest::load(path)?;
            info!("Loaded label manifest with {} entries", manifest.len());
            Some(manifest)
        }
        None => None,
    };

    let sources = scan_source_images(&config.input_dir)?;
    info!(
        "Found {} source images in {:?}",
        sources.len(),
        config.input_dir
    );

    let mut trainer = Trainer::<B>::new(
        &DigitClassifierConfig::new(),
        config.training.clone(),
        device.clone(),
    );
    let batcher = SliceBatcher::<B>::new(device.clone());

    let mut totals = RunningTotals::default();
    let mut matrix = ConfusionMatrix::new(NUM_CLASSES);
    let mut loss_sum = 0.0;
    let mut steps = 0usize;

    for (index, path) in sources.iter().enumerate() {
        match process_source_image(&mut trainer, &batcher, path, config, manifest.as_ref()) {
            Ok(Some(outcome)) => {
                for (&predicted, &actual) in outcome.predictions.iter().zip(&outcome.targets) {
                    matrix.record(predicted, actual);
                }
                loss_sum += outcome.loss;
                steps += 1;
                totals = totals.absorb_trained(outcome.samples);

                info!(
                    "Image {}/{}: trained on {} slices ({} samples total)",
                    index + 1,
                    sources.len(),
                    outcome.samples,
                    totals.samples_trained
                );
            }
            Ok(None) => {
                totals = totals.absorb_skipped();
                info!(
                    "Image {}/{}: no labeled slices, training step skipped",
                    index + 1,
                    sources.len()
                );
            }
            Err(err) => {
                totals = totals.absorb_skipped();
                warn!(
                    "Image {}/{} ({:?}) skipped: {}",
                    index + 1,
                    sources.len(),
                    path,
                    err
                );
            }
        }
    }

    trainer.save_artifact(&config.model_path)?;

    let report = TrainReport {
        totals,
        mean_loss: if steps > 0 { loss_sum / steps as f64 } else { 0.0 },
        train_accuracy: matrix.accuracy(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        model_artifact: artifact_file(&config.model_path),
    };
    report.save(&TrainReport::path_for(&config.model_path))?;

    Ok(report)
}

/// Process one source image: load, slice, persist, label, preprocess, and
/// run the training step. Returns `None` when the image contributes no
/// labeled slices (the step is skipped, not an error).
fn process_source_image<B: AutodiffBackend>(
    trainer: &mut Trainer<B>,
    batcher: &SliceBatcher<B>,
    path: &Path,
    config: &IncrementalRunConfig,
    manifest: Option<&LabelManifest>,
) -> Result<Option<StepOutcome>> {
    let image = image::open(path)
        .map_err(|e| DigitstripError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let mut name = match SourceName::parse(file_name) {
        Ok(name) => name,
        Err(err) => {
            warn!("{}; falling back to positional slice labels", err);
            SourceName::fallback(file_name)
        }
    };

    if let Some(manifest) = manifest {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        if let Some(digits) = manifest.digits_for(stem) {
            debug!("manifest overrides digits for '{}'", stem);
            name = name.with_digits(digits);
        }
    }

    let slices = slice_image(&image, &config.spec, &name)?;
    persist_slices(&slices, &config.slice_dir)?;

    let mut samples = Vec::with_capacity(slices.len());
    for slice in &slices {
        match name.label_for(slice.index) {
            SliceLabel::Digit(digit) => {
                // The save name of a digit-labeled slice always ends in that
                // digit, so the legacy filename channel must agree.
                debug_assert_eq!(
                    crate::dataset::labels::extract_trailing_digit_run(&slice.file_name),
                    Some(digit)
                );
                samples.push(SliceSample::from_slice(slice, digit));
            }
            SliceLabel::Positional(_) => {
                debug!(
                    "slice '{}' has no ground-truth digit, dropped from batch",
                    slice.file_name
                );
            }
        }
    }

    if samples.is_empty() {
        return Ok(None);
    }

    let batch = batcher.batch(samples);
    Ok(Some(trainer.train_step(&batch)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use image::{DynamicImage, Rgb, RgbImage};

    type TestBackend = Autodiff<burn::backend::NdArray>;

    fn write_strip(dir: &Path, file_name: &str) {
        let mut rgb = RgbImage::new(100, 30);
        for (x, _, pixel) in rgb.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 2) as u8, 128, 64]);
        }
        DynamicImage::ImageRgb8(rgb).save(dir.join(file_name)).unwrap();
    }

    fn quick_config(root: &Path) -> IncrementalRunConfig {
        let mut config = IncrementalRunConfig::new(
            root.join("input"),
            root.join("slices"),
            root.join("output").join("model"),
        );
        config.training.epochs_per_image = 1;
        config
    }

    #[test]
    fn test_run_counts_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());

        std::fs::create_dir_all(&config.input_dir).unwrap();
        write_strip(&config.input_dir, "20250219_082720_97919.jpg");
        write_strip(&config.input_dir, "snapshot.jpg");

        let device = Default::default();
        let report = run_incremental_training::<TestBackend>(&config, &device).unwrap();

        // The well-formed image trains on all 5 slices; the fallback one has
        // only positional labels and contributes an empty batch.
        assert_eq!(report.totals.images_seen, 2);
        assert_eq!(report.totals.images_trained, 1);
        assert_eq!(report.totals.images_skipped, 1);
        assert_eq!(report.totals.samples_trained, 5);

        assert!(report.model_artifact.exists());
        assert!(TrainReport::path_for(&config.model_path).exists());

        for name in [
            "0_20250219_082720_9.jpg",
            "1_20250219_082720_7.jpg",
            "2_20250219_082720_9.jpg",
            "3_20250219_082720_1.jpg",
            "4_20250219_082720_9.jpg",
        ] {
            assert!(config.slice_dir.join(name).exists(), "missing slice {}", name);
        }
        // Fallback naming for the malformed filename.
        assert!(config.slice_dir.join("0_snapshot_0.jpg").exists());
    }

    #[test]
    fn test_manifest_labels_fallback_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quick_config(dir.path());

        std::fs::create_dir_all(&config.input_dir).unwrap();
        write_strip(&config.input_dir, "snapshot.jpg");

        let manifest_path = dir.path().join("labels.json");
        std::fs::write(&manifest_path, r#"{"snapshot": "40271"}"#).unwrap();
        config.manifest_path = Some(manifest_path);

        let device = Default::default();
        let report = run_incremental_training::<TestBackend>(&config, &device).unwrap();

        assert_eq!(report.totals.images_trained, 1);
        assert_eq!(report.totals.samples_trained, 5);
        // Manifest digits drive the naming suffix as well as the labels.
        assert!(config.slice_dir.join("0_snapshot_4.jpg").exists());
    }

    #[test]
    fn test_totals_are_append_only() {
        let totals = RunningTotals::default()
            .absorb_trained(5)
            .absorb_skipped()
            .absorb_trained(3);

        assert_eq!(totals.images_seen, 3);
        assert_eq!(totals.images_trained, 2);
        assert_eq!(totals.images_skipped, 1);
        assert_eq!(totals.samples_trained, 8);
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());

        let device = Default::default();
        let result = run_incremental_training::<TestBackend>(&config, &device);
        assert!(matches!(result, Err(DigitstripError::MissingSource(_))));
    }
}
