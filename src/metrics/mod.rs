//! Classification metrics: accuracy, confusion matrix, precision/recall/F1.

mod report;

use crate::dataset::DatasetType;
use log::warn;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Dominant class of the BMU, `None` when the BMU is unclassified.
    pub predicted: Option<usize>,
    /// Ground-truth label.
    pub truth: usize,
    /// Distance from the input to the BMU weights. Lower is a tighter match.
    pub confidence: f32,
}

impl ClassificationResult {
    /// Creates a new result.
    pub fn new(predicted: Option<usize>, truth: usize, confidence: f32) -> Self {
        Self {
            predicted,
            truth,
            confidence,
        }
    }

    /// True when the prediction equals the ground truth.
    #[inline]
    pub fn is_correct(&self) -> bool {
        self.predicted == Some(self.truth)
    }
}

/// Summary of a batch of classification results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Fraction of all results whose prediction equals the truth.
    pub accuracy: f32,
    /// `confusion_matrix[true][predicted]` counts.
    pub confusion_matrix: Vec<Vec<u32>>,
    /// Per-class precision.
    pub precision: Vec<f32>,
    /// Per-class recall.
    pub recall: Vec<f32>,
    /// Per-class F1 score.
    pub f1: Vec<f32>,
    /// Unweighted mean of `precision`.
    pub average_precision: f32,
    /// Unweighted mean of `recall`.
    pub average_recall: f32,
    /// Unweighted mean of `f1`.
    pub average_f1: f32,
    /// Dataset family the results came from.
    pub dataset_type: DatasetType,
    /// Results left out of the confusion matrix because a label was out of range.
    pub excluded: usize,
}

impl MetricsReport {
    /// Number of classes in the confusion matrix.
    pub fn num_classes(&self) -> usize {
        self.confusion_matrix.len()
    }

    /// Display name for a class index.
    pub fn class_name(&self, class: usize) -> String {
        match self.dataset_type.label_names().get(class) {
            Some(name) => (*name).to_string(),
            None => class.to_string(),
        }
    }
}

/// Per-class precision, recall and F1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassScores {
    /// Per-class precision.
    pub precision: Vec<f32>,
    /// Per-class recall.
    pub recall: Vec<f32>,
    /// Per-class F1 score.
    pub f1: Vec<f32>,
}

/// Metric computations over classification results.
pub struct Metrics;

impl Metrics {
    /// Builds the full report for a batch of results.
    pub fn evaluate_classification(
        results: &[ClassificationResult],
        dataset_type: DatasetType,
        num_classes: usize,
    ) -> MetricsReport {
        let accuracy = Self::accuracy(results);
        let confusion_matrix = Self::confusion_matrix(results, num_classes);

        let counted: u32 = confusion_matrix.iter().flatten().sum();
        let excluded = results.len() - counted as usize;
        if excluded > 0 {
            warn!(
                "{} of {} results have labels outside [0, {}) and are not in the confusion matrix",
                excluded,
                results.len(),
                num_classes
            );
        }

        let scores = Self::precision_recall_f1(&confusion_matrix);

        MetricsReport {
            accuracy,
            average_precision: mean(&scores.precision),
            average_recall: mean(&scores.recall),
            average_f1: mean(&scores.f1),
            precision: scores.precision,
            recall: scores.recall,
            f1: scores.f1,
            confusion_matrix,
            dataset_type,
            excluded,
        }
    }

    /// Fraction of results whose prediction equals the truth, over the whole
    /// list including out-of-range labels. Empty input yields 0.
    pub fn accuracy(results: &[ClassificationResult]) -> f32 {
        if results.is_empty() {
            return 0.0;
        }
        let correct = results.iter().filter(|r| r.is_correct()).count();
        correct as f32 / results.len() as f32
    }

    /// Builds a `num_classes × num_classes` matrix indexed `[true][predicted]`.
    ///
    /// Results with either label outside `[0, num_classes)` are skipped.
    pub fn confusion_matrix(results: &[ClassificationResult], num_classes: usize) -> Vec<Vec<u32>> {
        let mut matrix = vec![vec![0u32; num_classes]; num_classes];

        for result in results {
            if let Some(predicted) = result.predicted {
                if result.truth < num_classes && predicted < num_classes {
                    matrix[result.truth][predicted] += 1;
                }
            }
        }

        matrix
    }

    /// Per-class precision, recall and F1 from a confusion matrix.
    ///
    /// Any zero denominator yields 0 for that entry.
    pub fn precision_recall_f1(matrix: &[Vec<u32>]) -> ClassScores {
        let n = matrix.len();
        let mut scores = ClassScores {
            precision: vec![0.0; n],
            recall: vec![0.0; n],
            f1: vec![0.0; n],
        };

        for i in 0..n {
            let true_positives = matrix[i][i];
            let predicted_positives: u32 = matrix.iter().map(|row| row[i]).sum();
            let actual_positives: u32 = matrix[i].iter().sum();

            let p = ratio(true_positives, predicted_positives);
            let r = ratio(true_positives, actual_positives);

            scores.precision[i] = p;
            scores.recall[i] = r;
            scores.f1[i] = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        }

        scores
    }
}

#[inline]
fn ratio(num: u32, den: u32) -> f32 {
    if den > 0 {
        num as f32 / den as f32
    } else {
        0.0
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
