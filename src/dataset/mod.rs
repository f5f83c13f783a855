//! Dataset module for digit strip data handling
//!
//! This module provides:
//! - Fixed-geometry slicing of source images into digit cells
//! - Label derivation from encoded filenames or an explicit manifest
//! - Sample preprocessing into the classifier's input shape
//! - Batch assembly for incremental training steps
//!
//! ## Source layout
//!
//! A source folder is flat: one image per numeral strip, named
//! `{date}_{time}_{digits}.{ext}`. There are no class subdirectories; the
//! label channel is the filename (or the manifest overriding it).

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::utils::error::{DigitstripError, Result};

pub mod batcher;
pub mod labels;
pub mod sample;
pub mod slicer;

// Re-export main types for convenience
pub use batcher::{stack_slices, SliceBatch, SliceBatcher};
pub use labels::{extract_trailing_digit_run, LabelManifest, SliceLabel, SourceName};
pub use sample::{preprocess, SliceSample};
pub use slicer::{persist_slices, slice_image, Slice, SliceBand, SliceSpec};

/// File extensions accepted as source images
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Enumerate the source images in a folder, sorted by path for a
/// deterministic processing order.
pub fn scan_source_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(DigitstripError::MissingSource(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    IMAGE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    Ok(paths)
}

/// Statistics about a source folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_images: usize,
    /// Filenames following the `{date}_{time}_{digits}` convention
    pub well_formed: usize,
    /// Filenames that will fall back to positional slice labels
    pub malformed: usize,
    /// Occurrences of each digit across well-formed digit strings
    pub digit_counts: [usize; 10],
}

impl DatasetStats {
    /// Gather statistics from a list of source image paths
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut stats = Self::default();

        for path in paths {
            stats.total_images += 1;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();

            match SourceName::parse(file_name) {
                Ok(name) => {
                    stats.well_formed += 1;
                    for c in name.digits.chars().filter(char::is_ascii_digit) {
                        stats.digit_counts[(c as u8 - b'0') as usize] += 1;
                    }
                }
                Err(_) => stats.malformed += 1,
            }
        }

        stats
    }

    /// Print statistics to console
    pub fn print(&self) {
        println!("\n📊 Dataset statistics:");
        println!("  Total images: {}", self.total_images);
        println!("  Labeled filenames: {}", self.well_formed);
        if self.malformed > 0 {
            println!(
                "  {} {}",
                "Fallback filenames:".yellow(),
                self.malformed
            );
        }

        println!("\n  Digit occurrences:");
        let max = self.digit_counts.iter().max().copied().unwrap_or(0).max(1);
        for (digit, &count) in self.digit_counts.iter().enumerate() {
            let bar_len = count * 40 / max;
            let bar: String = "█".repeat(bar_len);
            println!("    {}: {:5} {}", digit, count, bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "20250219_082720_97919.jpg",
            "20250218_070101_12345.png",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"stub").unwrap();
        }

        let paths = scan_source_images(dir.path()).unwrap();
        let names: Vec<&str> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(
            names,
            vec!["20250218_070101_12345.png", "20250219_082720_97919.jpg"]
        );
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_source_images(&missing),
            Err(DigitstripError::MissingSource(_))
        ));
    }

    #[test]
    fn test_stats_counts() {
        let paths = vec![
            PathBuf::from("20250219_082720_97919.jpg"),
            PathBuf::from("snapshot.jpg"),
        ];
        let stats = DatasetStats::from_paths(&paths);

        assert_eq!(stats.total_images, 2);
        assert_eq!(stats.well_formed, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.digit_counts[9], 3);
        assert_eq!(stats.digit_counts[7], 1);
        assert_eq!(stats.digit_counts[1], 1);
        assert_eq!(stats.digit_counts[0], 0);
    }
}
