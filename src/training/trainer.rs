//! Incremental trainer
//!
//! Wraps the digit classifier and an Adam optimizer and exposes one
//! operation: a single incremental update on the batch derived from one
//! source image. Checkpointing uses Burn's `CompactRecorder`, which records
//! module parameters only: the saved artifact is inference-ready but does
//! not carry optimizer momentum.

use std::path::Path;

use burn::{
    module::Module,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use tracing::{debug, info};

use super::TrainingConfig;
use crate::dataset::batcher::SliceBatch;
use crate::model::cnn::{DigitClassifier, DigitClassifierConfig};
use crate::utils::error::{DigitstripError, Result};

/// Outcome of one incremental update on a single image batch
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Number of samples in the batch
    pub samples: usize,
    /// Mean cross-entropy loss across the passes of this step
    pub loss: f64,
    /// Pre-update predictions on the batch, in slice order
    pub predictions: Vec<usize>,
    /// Ground-truth labels, in slice order
    pub targets: Vec<usize>,
    /// Correct pre-update predictions
    pub correct: usize,
}

/// Trainer for the digit classifier
pub struct Trainer<B: AutodiffBackend> {
    /// Model being trained
    pub model: DigitClassifier<B>,
    /// Adam optimizer
    optimizer: burn::optim::adaptor::OptimizerAdaptor<
        burn::optim::Adam<B::InnerBackend>,
        DigitClassifier<B>,
        B,
    >,
    /// Training configuration
    pub config: TrainingConfig,
    /// Device to train on
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a trainer with a freshly initialized model
    pub fn new(
        model_config: &DigitClassifierConfig,
        config: TrainingConfig,
        device: B::Device,
    ) -> Self {
        let model = DigitClassifier::new(model_config, &device);
        let optimizer = AdamConfig::new().init();

        Self {
            model,
            optimizer,
            config,
            device,
        }
    }

    /// Run one incremental training step on a per-image batch.
    ///
    /// Performs `epochs_per_image` forward/backward passes over the whole
    /// batch. Pre-update predictions are captured on the first pass for the
    /// running training metrics.
    pub fn train_step(&mut self, batch: &SliceBatch<B>) -> StepOutcome {
        let samples = batch.targets.dims()[0];
        let epochs = self.config.epochs_per_image.max(1);

        let mut total_loss = 0.0;
        let mut first_pass: Option<(Vec<usize>, usize)> = None;

        for _ in 0..epochs {
            let output = self.model.forward(batch.images.clone());

            let loss = CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.clone().into_scalar().elem();
            total_loss += loss_value;

            if first_pass.is_none() {
                let predictions = output.argmax(1).squeeze::<1>(1);
                let correct_tensor = predictions
                    .clone()
                    .equal(batch.targets.clone())
                    .int()
                    .sum();
                let correct: i64 = correct_tensor.into_scalar().elem();

                let pred_vec: Vec<i64> = predictions.into_data().to_vec().unwrap();
                first_pass = Some((
                    pred_vec.iter().map(|&p| p as usize).collect(),
                    correct as usize,
                ));
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self
                .optimizer
                .step(self.config.learning_rate, self.model.clone(), grads);
        }

        let (predictions, correct) = first_pass.unwrap_or_default();
        let target_vec: Vec<i64> = batch.targets.clone().into_data().to_vec().unwrap();
        let loss = total_loss / epochs as f64;

        debug!("train step: {} samples, mean loss {:.4}", samples, loss);

        StepOutcome {
            samples,
            loss,
            predictions,
            targets: target_vec.iter().map(|&t| t as usize).collect(),
            correct,
        }
    }

    /// Save the model artifact (parameters only, no optimizer state)
    pub fn save_artifact(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let recorder = CompactRecorder::new();
        self.model
            .clone()
            .save_file(path, &recorder)
            .map_err(|e| DigitstripError::Model(format!("failed to save model: {:?}", e)))?;

        info!("Model artifact saved to {:?}", path);
        Ok(())
    }

    /// Load model parameters from an artifact
    pub fn load_artifact(&mut self, path: &Path) -> Result<()> {
        let recorder = CompactRecorder::new();
        self.model = self
            .model
            .clone()
            .load_file(path, &recorder, &self.device)
            .map_err(|e| DigitstripError::Model(format!("failed to load model: {:?}", e)))?;

        info!("Model artifact loaded from {:?}", path);
        Ok(())
    }

    /// Get a reference to the model
    pub fn model(&self) -> &DigitClassifier<B> {
        &self.model
    }

    /// Get the device
    pub fn device(&self) -> &B::Device {
        &self.device
    }
}
