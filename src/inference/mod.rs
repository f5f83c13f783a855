//! Inference module for number reading
//!
//! This module provides:
//! - Loading a trained artifact into a predictor
//! - Batched per-slice digit prediction with confidences
//! - The single-image reading pipeline reconstructing the full number string

pub mod predictor;
pub mod reader;

// Re-export main types for convenience
pub use predictor::{DigitPrediction, Predictor, ReadingResult};
pub use reader::{read_number, ReaderConfig};
