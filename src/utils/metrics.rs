//! Training metrics
//!
//! A small confusion matrix over the digit classes, accumulated from the
//! pre-update predictions of each incremental training step and summarized
//! in the end-of-run report.

use serde::{Deserialize, Serialize};

/// Confusion matrix over a fixed set of classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// counts[actual][predicted]
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Create an empty matrix for the given number of classes
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Build a matrix from parallel prediction/target slices
    pub fn from_predictions(predictions: &[usize], targets: &[usize], num_classes: usize) -> Self {
        let mut matrix = Self::new(num_classes);
        for (&predicted, &actual) in predictions.iter().zip(targets) {
            matrix.record(predicted, actual);
        }
        matrix
    }

    /// Record one prediction; out-of-range pairs are ignored
    pub fn record(&mut self, predicted: usize, actual: usize) {
        if predicted < self.num_classes && actual < self.num_classes {
            self.counts[actual][predicted] += 1;
        }
    }

    /// Total number of recorded predictions
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of correct predictions (the diagonal)
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.counts[i][i]).sum()
    }

    /// Overall accuracy, 0.0 when nothing has been recorded
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.correct() as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Per-class accuracy; `None` for classes with no recorded samples
    pub fn per_class_accuracy(&self) -> Vec<Option<f64>> {
        self.counts
            .iter()
            .enumerate()
            .map(|(actual, row)| {
                let total: usize = row.iter().sum();
                if total > 0 {
                    Some(row[actual] as f64 / total as f64)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matrix() {
        let matrix = ConfusionMatrix::new(10);
        assert_eq!(matrix.total(), 0);
        assert_eq!(matrix.accuracy(), 0.0);
    }

    #[test]
    fn test_accuracy() {
        let predictions = [1, 2, 3, 3];
        let targets = [1, 2, 3, 4];
        let matrix = ConfusionMatrix::from_predictions(&predictions, &targets, 10);

        assert_eq!(matrix.total(), 4);
        assert_eq!(matrix.correct(), 3);
        assert!((matrix.accuracy() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_per_class_accuracy() {
        let mut matrix = ConfusionMatrix::new(3);
        matrix.record(0, 0);
        matrix.record(1, 0);
        matrix.record(2, 2);

        let per_class = matrix.per_class_accuracy();
        assert_eq!(per_class[0], Some(0.5));
        assert_eq!(per_class[1], None);
        assert_eq!(per_class[2], Some(1.0));
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut matrix = ConfusionMatrix::new(3);
        matrix.record(5, 0);
        matrix.record(0, 5);
        assert_eq!(matrix.total(), 0);
    }
}
