//! Error Handling Module
//!
//! Defines custom error types for the digitstrip library.
//! Uses thiserror for ergonomic error definitions.
//!
//! Fatal preconditions (`MissingSource`) abort a run with a single clear
//! diagnostic; everything else is a per-image or per-slice anomaly that the
//! orchestrator isolates and logs without stopping the loop.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for digitstrip operations
#[derive(Error, Debug)]
pub enum DigitstripError {
    /// A required input (model artifact, test image, source folder) is absent
    #[error("missing source: required file not found: {0}")]
    MissingSource(PathBuf),

    /// Filename stem does not decompose into `{date}_{time}_{digits}`
    #[error("malformed filename '{0}': expected {{date}}_{{time}}_{{digits}}.{{ext}}")]
    MalformedFilename(String),

    /// A slice name yields no extractable digit label
    #[error("slice '{0}' has no extractable digit label")]
    UnlabelableSlice(String),

    /// Slice geometry is internally inconsistent (`end <= start`, zero slices)
    #[error("invalid slice geometry: {0}")]
    InvalidGeometry(String),

    /// Crop bounds exceed the source image dimensions
    #[error("crop end {end} exceeds image width {width}")]
    GeometryOutOfBounds { end: u32, width: u32 },

    /// Error loading or decoding an image
    #[error("failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error writing a persisted slice file
    #[error("failed to write slice '{0}': {1}")]
    SliceWrite(PathBuf, String),

    /// Error with model operations (save, load, record format)
    #[error("model error: {0}")]
    Model(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for digitstrip operations
pub type Result<T> = std::result::Result<T, DigitstripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_display() {
        let err = DigitstripError::MissingSource(PathBuf::from("/tmp/digit_model.mpk"));
        assert!(format!("{}", err).contains("digit_model.mpk"));
    }

    #[test]
    fn test_geometry_out_of_bounds_display() {
        let err = DigitstripError::GeometryOutOfBounds { end: 83, width: 60 };
        let msg = format!("{}", err);
        assert!(msg.contains("83"));
        assert!(msg.contains("60"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DigitstripError = io.into();
        assert!(matches!(err, DigitstripError::Io(_)));
    }
}
