//! Shared utilities for the digitstrip pipeline
//!
//! This module provides:
//! - The crate-wide error taxonomy
//! - Structured logging configuration
//! - Training metrics (confusion matrix, accuracy)

pub mod error;
pub mod logging;
pub mod metrics;

// Re-export main types for convenience
pub use error::{DigitstripError, Result};
pub use logging::{init_logging, LogConfig, LogLevel};
pub use metrics::ConfusionMatrix;
