//! Training module for the incremental per-image loop
//!
//! This module provides:
//! - The trainer wrapping the model and the Adam optimizer
//! - The incremental orchestrator: one training step per source image
//! - The end-of-run report persisted beside the model artifact
//!
//! ## Incremental training
//!
//! The classifier is updated once per source image, on the batch of labeled
//! slices derived from that image alone. Training is monotonic and
//! append-only across images; there is no mechanism to undo a bad batch.

use serde::{Deserialize, Serialize};

pub mod incremental;
pub mod trainer;

// Re-export main types for convenience
pub use incremental::{
    run_incremental_training, IncrementalRunConfig, RunningTotals, TrainReport,
};
pub use trainer::{StepOutcome, Trainer};

/// Default passes over each per-image batch
pub const DEFAULT_EPOCHS_PER_IMAGE: usize = 2;

/// Default Adam learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;

/// Hyperparameters for the incremental loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Passes over each per-image batch within one incremental step
    pub epochs_per_image: usize,
    /// Adam learning rate
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs_per_image: DEFAULT_EPOCHS_PER_IMAGE,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs_per_image, 2);
        assert_eq!(config.learning_rate, 1e-3);
    }
}
