//! Classification report for a held-out split.

use serde::Serialize;
use tracing::info;

use crate::types::Label;

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
    pub total: usize,
}

impl ClassificationReport {
    /// Build from paired truth and prediction sequences.
    ///
    /// Undefined ratios (no predictions or no support for a class) count as 0.
    pub fn compute(actual: &[Label], predicted: &[Label]) -> Self {
        let total = actual.len().min(predicted.len());
        let pairs = || actual.iter().zip(predicted.iter()).take(total);

        let classes: Vec<ClassMetrics> = Label::ALL
            .iter()
            .map(|&label| {
                let tp = pairs().filter(|(a, p)| **a == label && **p == label).count();
                let predicted_as = pairs().filter(|(_, p)| **p == label).count();
                let support = pairs().filter(|(a, _)| **a == label).count();

                let precision = safe_div(tp as f64, predicted_as as f64);
                let recall = safe_div(tp as f64, support as f64);
                let f1 = safe_div(2.0 * precision * recall, precision + recall);

                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let correct = pairs().filter(|(a, p)| a == p).count();
        let accuracy = safe_div(correct as f64, total as f64);
        let macro_f1 = classes.iter().map(|c| c.f1).sum::<f64>() / classes.len() as f64;
        let weighted_f1 = safe_div(
            classes.iter().map(|c| c.f1 * c.support as f64).sum::<f64>(),
            total as f64,
        );

        Self {
            classes,
            accuracy,
            macro_f1,
            weighted_f1,
            total,
        }
    }

    pub fn class(&self, label: Label) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }

    /// One line per class plus the summary.
    pub fn log(&self) {
        for c in &self.classes {
            info!(
                "{:>4}: precision={:.2} recall={:.2} f1={:.2} support={}",
                c.label.as_i8(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            );
        }
        info!(
            "accuracy={:.2} macro_f1={:.2} weighted_f1={:.2} samples={}",
            self.accuracy, self.macro_f1, self.weighted_f1, self.total
        );
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let labels = vec![Label::Buy, Label::Sell, Label::Hold, Label::Buy];
        let report = ClassificationReport::compute(&labels, &labels);
        assert_eq!(report.accuracy, 1.0);
        for c in &report.classes {
            assert_eq!(c.precision, 1.0);
            assert_eq!(c.recall, 1.0);
        }
        assert_eq!(report.class(Label::Buy).unwrap().support, 2);
    }

    #[test]
    fn test_mixed_predictions() {
        let actual = vec![Label::Buy, Label::Buy, Label::Sell, Label::Hold];
        let predicted = vec![Label::Buy, Label::Hold, Label::Sell, Label::Hold];
        let report = ClassificationReport::compute(&actual, &predicted);

        assert_eq!(report.accuracy, 0.75);
        let buy = report.class(Label::Buy).unwrap();
        assert_eq!(buy.precision, 1.0);
        assert_eq!(buy.recall, 0.5);
        assert!((buy.f1 - 2.0 / 3.0).abs() < 1e-12);

        let hold = report.class(Label::Hold).unwrap();
        assert_eq!(hold.precision, 0.5);
        assert_eq!(hold.recall, 1.0);
    }

    #[test]
    fn test_absent_class_scores_zero() {
        let actual = vec![Label::Buy, Label::Buy];
        let predicted = vec![Label::Buy, Label::Buy];
        let report = ClassificationReport::compute(&actual, &predicted);
        let sell = report.class(Label::Sell).unwrap();
        assert_eq!(sell.support, 0);
        assert_eq!(sell.f1, 0.0);
    }

    #[test]
    fn test_empty_report() {
        let report = ClassificationReport::compute(&[], &[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
    }
}
