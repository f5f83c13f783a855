//! Predictor
//!
//! Loads a trained model artifact and maps batches of normalized slice
//! tensors to per-slice digit predictions with confidences. The predicted
//! digit is the argmax of the class probabilities; the confidence is that
//! maximum probability.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

use crate::model::artifact_file;
use crate::model::cnn::{DigitClassifier, DigitClassifierConfig};
use crate::utils::error::{DigitstripError, Result};

/// Prediction for a single digit cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitPrediction {
    /// Slice index (geometric left-to-right order)
    pub index: usize,
    /// Predicted digit in `[0, 9]`
    pub digit: u8,
    /// Maximum class probability
    pub confidence: f32,
}

/// The reconstructed number for one source image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingResult {
    /// Path to the input image
    pub image_path: PathBuf,
    /// Predicted digits concatenated in slice order
    pub number: String,
    /// Per-slice predictions for diagnostic display
    pub digits: Vec<DigitPrediction>,
}

impl ReadingResult {
    /// Pretty print the reading result
    pub fn display(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Image: {:?}\n", self.image_path));
        for prediction in &self.digits {
            output.push_str(&format!(
                "  slice {}: {} ({:.1}%)\n",
                prediction.index,
                prediction.digit,
                prediction.confidence * 100.0
            ));
        }
        output.push_str(&format!("Number: {}\n", self.number));

        output
    }
}

/// Predictor wrapping a trained digit classifier
pub struct Predictor<B: Backend> {
    model: DigitClassifier<B>,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    /// Load a predictor from a trained model artifact.
    ///
    /// Fails with [`DigitstripError::MissingSource`] when the artifact file
    /// does not exist, checked before anything else happens.
    pub fn from_artifact(path: &Path, device: B::Device) -> Result<Self> {
        let file = artifact_file(path);
        if !file.exists() {
            return Err(DigitstripError::MissingSource(file));
        }

        let recorder = CompactRecorder::new();
        let model = DigitClassifier::new(&DigitClassifierConfig::new(), &device)
            .load_file(path, &recorder, &device)
            .map_err(|e| DigitstripError::Model(format!("failed to load model: {:?}", e)))?;

        Ok(Self { model, device })
    }

    /// Wrap an in-memory model (testing, custom loading)
    pub fn from_model(model: DigitClassifier<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Predict digits for a batch of normalized slice tensors.
    ///
    /// Rows are returned in batch order, which for the reading pipeline is
    /// the geometric slice order.
    pub fn predict(&self, images: Tensor<B, 4>) -> Vec<DigitPrediction> {
        let probs = self.model.forward_softmax(images);

        let confidences = probs.clone().max_dim(1);
        let predictions = probs.argmax(1);

        let pred_vec: Vec<i64> = predictions.into_data().to_vec().unwrap();
        let conf_vec: Vec<f32> = confidences.into_data().to_vec().unwrap();

        pred_vec
            .into_iter()
            .zip(conf_vec)
            .enumerate()
            .map(|(index, (digit, confidence))| DigitPrediction {
                index,
                digit: digit as u8,
                confidence,
            })
            .collect()
    }

    /// Get the device
    pub fn device(&self) -> &B::Device {
        &self.device
    }
}
