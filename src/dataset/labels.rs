//! Label derivation for digit slices
//!
//! Source filenames follow the convention `{date}_{time}_{digits}.{ext}`:
//! the third underscore-separated part of the stem is the ground-truth digit
//! string, indexed by slice position. An explicit [`LabelManifest`] can
//! override the filename-encoded digit string, decoupling storage naming from
//! training semantics. The positional-index fallback is kept as an explicit
//! variant of [`SliceLabel`] rather than a fabricated digit.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{DigitstripError, Result};

/// Naming key parsed from a source image filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    /// The `{date}_{time}` fragment carried into every slice name
    pub stamp: String,
    /// The ground-truth digit string, indexed by slice position
    pub digits: String,
}

impl SourceName {
    /// Parse a filename of the form `{date}_{time}_{digits}.{ext}`.
    ///
    /// Fails with [`DigitstripError::MalformedFilename`] when the stem does
    /// not split into exactly three underscore-separated parts.
    pub fn parse(file_name: &str) -> Result<Self> {
        let stem = stem_of(file_name);
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() != 3 {
            return Err(DigitstripError::MalformedFilename(file_name.to_string()));
        }

        Ok(Self {
            stamp: format!("{}_{}", parts[0], parts[1]),
            digits: parts[2].to_string(),
        })
    }

    /// Naming key for filenames outside the convention: the whole stem as the
    /// stamp and an empty digit string, so every slice label is positional.
    pub fn fallback(file_name: &str) -> Self {
        Self {
            stamp: stem_of(file_name).to_string(),
            digits: String::new(),
        }
    }

    /// Replace the digit string, e.g. with a manifest entry.
    pub fn with_digits(mut self, digits: impl Into<String>) -> Self {
        self.digits = digits.into();
        self
    }

    /// The naming suffix for slice `index`: the index-th character of the
    /// digit string if present, else the index itself in decimal.
    pub fn suffix_for(&self, index: usize) -> String {
        self.digits
            .chars()
            .nth(index)
            .map(|c| c.to_string())
            .unwrap_or_else(|| index.to_string())
    }

    /// The label for slice `index`: a real digit when the digit string has an
    /// ASCII digit at that position, else the explicit positional fallback.
    pub fn label_for(&self, index: usize) -> SliceLabel {
        match self.digits.chars().nth(index) {
            Some(c) if c.is_ascii_digit() => SliceLabel::Digit(c as u8 - b'0'),
            _ => SliceLabel::Positional(index),
        }
    }

    /// Derived save name for slice `index`: `{index}_{stamp}_{suffix}.jpg`.
    pub fn slice_file_name(&self, index: usize) -> String {
        format!("{}_{}_{}.jpg", index, self.stamp, self.suffix_for(index))
    }
}

/// Ground-truth label of one slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceLabel {
    /// A real digit in `[0, 9]`
    Digit(u8),
    /// Positional fallback for slices without a ground-truth digit; such
    /// slices keep their naming suffix but do not enter a training batch
    Positional(usize),
}

impl SliceLabel {
    /// The digit value, if this is a real label
    pub fn digit(&self) -> Option<u8> {
        match self {
            SliceLabel::Digit(d) => Some(*d),
            SliceLabel::Positional(_) => None,
        }
    }

    /// Whether this label can enter a training batch
    pub fn is_digit(&self) -> bool {
        matches!(self, SliceLabel::Digit(_))
    }
}

/// Extract the last run of ASCII digits in `name`, accepted only when its
/// numeric value lies in `[0, 9]`.
///
/// This is the legacy label channel of persisted slice names: the slicer
/// always embeds either a real digit or a positional index as the trailing
/// fragment, both single-digit runs, so `None` is unreachable for names the
/// slicer produced. It remains a defensive check for foreign files.
pub fn extract_trailing_digit_run(name: &str) -> Option<u8> {
    let mut last: Option<String> = None;
    let mut current = String::new();

    for c in name.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            last = Some(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        last = Some(current);
    }

    let value: u32 = last?.parse().ok()?;
    u8::try_from(value).ok().filter(|d| *d <= 9)
}

/// Explicit mapping from image stem to digit string
///
/// Stored as a plain JSON object, e.g.
/// `{"20250219_082720_97919": "97919"}`. Entries override the
/// filename-encoded digit string during training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelManifest {
    entries: HashMap<String, String>,
}

impl LabelManifest {
    /// Load a manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| DigitstripError::Serialization(e.to_string()))
    }

    /// Register a digit string for an image stem
    pub fn insert(&mut self, stem: impl Into<String>, digits: impl Into<String>) {
        self.entries.insert(stem.into(), digits.into());
    }

    /// The digit string registered for an image stem, if any
    pub fn digits_for(&self, stem: &str) -> Option<&str> {
        self.entries.get(stem).map(String::as_str)
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let name = SourceName::parse("20250219_082720_97919.jpg").unwrap();
        assert_eq!(name.stamp, "20250219_082720");
        assert_eq!(name.digits, "97919");
    }

    #[test]
    fn test_parse_rejects_wrong_part_count() {
        assert!(matches!(
            SourceName::parse("justone.jpg"),
            Err(DigitstripError::MalformedFilename(_))
        ));
        assert!(matches!(
            SourceName::parse("a_b_c_d.jpg"),
            Err(DigitstripError::MalformedFilename(_))
        ));
    }

    #[test]
    fn test_suffixes_follow_digit_string() {
        let name = SourceName::parse("20250219_082720_97919.jpg").unwrap();
        let suffixes: Vec<String> = (0..5).map(|i| name.suffix_for(i)).collect();
        assert_eq!(suffixes, vec!["9", "7", "9", "1", "9"]);
    }

    #[test]
    fn test_short_digit_string_falls_back_to_position() {
        let name = SourceName::parse("20250219_082720_12.jpg").unwrap();
        let suffixes: Vec<String> = (0..5).map(|i| name.suffix_for(i)).collect();
        assert_eq!(suffixes, vec!["1", "2", "2", "3", "4"]);

        assert_eq!(name.label_for(1), SliceLabel::Digit(2));
        assert_eq!(name.label_for(3), SliceLabel::Positional(3));
    }

    #[test]
    fn test_slice_file_names() {
        let name = SourceName::parse("20250219_082720_97919.jpg").unwrap();
        assert_eq!(name.slice_file_name(0), "0_20250219_082720_9.jpg");
        assert_eq!(name.slice_file_name(4), "4_20250219_082720_9.jpg");
    }

    #[test]
    fn test_fallback_name() {
        let name = SourceName::fallback("snapshot.png");
        assert_eq!(name.stamp, "snapshot");
        assert_eq!(name.label_for(0), SliceLabel::Positional(0));
        assert_eq!(name.slice_file_name(2), "2_snapshot_2.jpg");
    }

    #[test]
    fn test_non_digit_characters_are_positional() {
        let name = SourceName::parse("20250219_082720_9a919.jpg").unwrap();
        assert_eq!(name.label_for(0), SliceLabel::Digit(9));
        assert_eq!(name.label_for(1), SliceLabel::Positional(1));
    }

    #[test]
    fn test_extract_trailing_digit_run() {
        assert_eq!(
            extract_trailing_digit_run("0_20250219_082720_9.jpg"),
            Some(9)
        );
        assert_eq!(extract_trailing_digit_run("slice_007.jpg"), Some(7));
        assert_eq!(extract_trailing_digit_run("no-digits-here.jpg"), None);
        // A trailing run outside [0, 9] is not a usable label.
        assert_eq!(extract_trailing_digit_run("strip_42.jpg"), None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let name = "3_20250219_082720_1.jpg";
        assert_eq!(
            extract_trailing_digit_run(name),
            extract_trailing_digit_run(name)
        );
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"20250219_082720_97919": "12345"}"#).unwrap();

        let manifest = LabelManifest::load(&path).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.digits_for("20250219_082720_97919"), Some("12345"));
        assert_eq!(manifest.digits_for("unknown"), None);
    }

    #[test]
    fn test_manifest_overrides_digits() {
        let name = SourceName::parse("20250219_082720_97919.jpg")
            .unwrap()
            .with_digits("12345");
        assert_eq!(name.label_for(0), SliceLabel::Digit(1));
        // The stamp fragment is untouched by the override.
        assert_eq!(name.slice_file_name(0), "0_20250219_082720_1.jpg");
    }
}
