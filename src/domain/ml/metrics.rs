//! Evaluation metrics for the three-class movement problem.

use crate::domain::ml::movement::{CLASSES, Movement};
use serde::{Deserialize, Serialize};

const N_CLASSES: usize = CLASSES.len();

/// Per-class sample counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSupport {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl ClassSupport {
    pub fn from_labels(labels: &[Movement]) -> Self {
        let mut support = Self::default();
        for label in labels {
            match label {
                Movement::Bullish => support.bullish += 1,
                Movement::Bearish => support.bearish += 1,
                Movement::Neutral => support.neutral += 1,
            }
        }
        support
    }

    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.neutral
    }
}

/// Confusion matrix over the three movement classes.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    /// counts[actual][predicted]
    counts: [[usize; N_CLASSES]; N_CLASSES],
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[Movement], y_pred: &[Movement]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "label/prediction length mismatch");
        let mut counts = [[0usize; N_CLASSES]; N_CLASSES];
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            counts[t.as_index()][p.as_index()] += 1;
        }
        Self { counts }
    }

    fn actual(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    fn correct(&self, class: usize) -> usize {
        self.counts[class][class]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Accuracy plus support-weighted precision, recall and F1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationMetrics {
    pub fn calculate(y_true: &[Movement], y_pred: &[Movement]) -> Self {
        let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
        let total = cm.total() as f64;
        if total == 0.0 {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            };
        }

        let correct: usize = (0..N_CLASSES).map(|c| cm.correct(c)).sum();
        let accuracy = correct as f64 / total;

        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for class in 0..N_CLASSES {
            let support = cm.actual(class) as f64;
            if support == 0.0 {
                continue;
            }
            let weight = support / total;

            let predicted = cm.predicted(class) as f64;
            let tp = cm.correct(class) as f64;
            let class_precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
            let class_recall = tp / support;
            let class_f1 = if class_precision + class_recall > 0.0 {
                2.0 * class_precision * class_recall / (class_precision + class_recall)
            } else {
                0.0
            };

            precision += weight * class_precision;
            recall += weight * class_recall;
            f1 += weight * class_f1;
        }

        Self {
            accuracy,
            precision,
            recall,
            f1,
        }
    }
}
