//! # digitstrip
//!
//! A Rust library for reading multi-digit numeral strips from scanned images
//! using the Burn framework.
//!
//! Every source image holds one horizontal strip of digit cells at a fixed
//! geometry. The pipeline slices the strip into cells, derives ground-truth
//! labels from the encoded filename (or an explicit label manifest), and feeds
//! a small CNN one incremental training step per source image. Inference runs
//! the same slicing and preprocessing on a single image and reconstructs the
//! full number string with per-cell confidences.
//!
//! ## Modules
//!
//! - `dataset`: slicing geometry, label derivation, sample preprocessing, and
//!   batch assembly
//! - `model`: CNN architecture built with Burn
//! - `training`: the incremental per-image training loop
//! - `inference`: artifact loading, prediction, and number reconstruction
//! - `utils`: errors, logging, and training metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use digitstrip::backend::{default_device, TrainingBackend};
//! use digitstrip::training::incremental::{run_incremental_training, IncrementalRunConfig};
//!
//! let config = IncrementalRunConfig::new("dataset_folder", "processed_images", "digit_model");
//! let report = run_incremental_training::<TrainingBackend>(&config, &default_device())?;
//! println!("trained on {} samples", report.totals.samples_trained);
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::labels::{LabelManifest, SliceLabel, SourceName};
pub use dataset::slicer::{Slice, SliceSpec};
pub use inference::predictor::{DigitPrediction, Predictor, ReadingResult};
pub use model::cnn::{DigitClassifier, DigitClassifierConfig};
pub use training::incremental::{RunningTotals, TrainReport};
pub use training::{Trainer, TrainingConfig};
pub use utils::error::{DigitstripError, Result};

/// Digit classes recognized by the classifier (0-9).
pub const NUM_CLASSES: usize = 10;

/// Side length of the normalized square sample fed to the classifier.
pub const SAMPLE_SIZE: usize = 28;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
