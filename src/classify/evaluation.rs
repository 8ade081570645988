// src/classify/evaluation.rs
//! Confusion matrices and per-class evaluation reports.

use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;

use crate::error::{AnalysisError, AnalysisResult, ProcessingStage};

/// Count confusion matrix: rows are true classes, columns predictions.
pub fn confusion_matrix(
    truth: &[String],
    predicted: &[String],
    classes: &[String],
) -> AnalysisResult<Array2<usize>> {
    if truth.len() != predicted.len() {
        return Err(AnalysisError::processing(
            ProcessingStage::Evaluation,
            format!(
                "{} true labels but {} predictions",
                truth.len(),
                predicted.len()
            ),
        ));
    }
    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut matrix = Array2::zeros((classes.len(), classes.len()));
    for (truth_label, predicted_label) in truth.iter().zip(predicted.iter()) {
        let row = *index.get(truth_label.as_str()).ok_or_else(|| {
            AnalysisError::processing(
                ProcessingStage::Evaluation,
                format!("unknown true label {:?}", truth_label),
            )
        })?;
        let column = *index.get(predicted_label.as_str()).ok_or_else(|| {
            AnalysisError::processing(
                ProcessingStage::Evaluation,
                format!("unknown predicted label {:?}", predicted_label),
            )
        })?;
        matrix[[row, column]] += 1;
    }
    Ok(matrix)
}

/// Row-normalize a count matrix into per-class prediction fractions.
///
/// Rows with zero support stay zero.
pub fn fraction_matrix(counts: &Array2<usize>) -> Array2<f32> {
    let mut fractions = Array2::zeros(counts.dim());
    for (row_ix, row) in counts.rows().into_iter().enumerate() {
        let support: usize = row.iter().sum();
        if support == 0 {
            continue;
        }
        for (col_ix, &count) in row.iter().enumerate() {
            fractions[[row_ix, col_ix]] = count as f32 / support as f32;
        }
    }
    fractions
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// Class label.
    pub class: String,
    /// True positives over predicted positives.
    pub precision: f32,
    /// True positives over actual positives.
    pub recall: f32,
    /// Harmonic mean of precision and recall.
    pub f1: f32,
    /// Number of true instances of the class.
    pub support: usize,
}

/// Full evaluation of a prediction run.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    /// Fraction of correct predictions.
    pub accuracy: f32,
    /// Per-class metrics, in class order.
    pub per_class: Vec<ClassMetrics>,
    /// Count confusion matrix.
    pub counts: Array2<usize>,
    /// Class labels, defining matrix order.
    pub classes: Vec<String>,
}

impl ClassificationReport {
    /// Evaluate predictions against true labels over the given classes.
    pub fn from_predictions(
        truth: &[String],
        predicted: &[String],
        classes: &[String],
    ) -> AnalysisResult<Self> {
        if truth.is_empty() {
            return Err(AnalysisError::processing(
                ProcessingStage::Evaluation,
                "no labels to evaluate",
            ));
        }
        let counts = confusion_matrix(truth, predicted, classes)?;

        let correct: usize = (0..classes.len()).map(|i| counts[[i, i]]).sum();
        let accuracy = correct as f32 / truth.len() as f32;

        let per_class = classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let support: usize = counts.row(i).iter().sum();
                let predicted_count: usize = counts.column(i).iter().sum();
                let true_positives = counts[[i, i]];
                let precision = ratio(true_positives, predicted_count);
                let recall = ratio(true_positives, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class: class.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        Ok(Self {
            accuracy,
            per_class,
            counts,
            classes: classes.to_vec(),
        })
    }

    /// Row-normalized confusion fractions.
    pub fn fractions(&self) -> Array2<f32> {
        fraction_matrix(&self.counts)
    }

    /// Unweighted mean of per-class precision, recall and F1.
    pub fn macro_average(&self) -> (f32, f32, f32) {
        let n = self.per_class.len().max(1) as f32;
        let precision = self.per_class.iter().map(|m| m.precision).sum::<f32>() / n;
        let recall = self.per_class.iter().map(|m| m.recall).sum::<f32>() / n;
        let f1 = self.per_class.iter().map(|m| m.f1).sum::<f32>() / n;
        (precision, recall, f1)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(0)
            .max("macro avg".len());
        writeln!(
            f,
            "{:>width$}  precision  recall  f1-score  support",
            "",
            width = width
        )?;
        for metrics in &self.per_class {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
                metrics.class,
                metrics.precision,
                metrics.recall,
                metrics.f1,
                metrics.support,
                width = width
            )?;
        }
        let total: usize = self.per_class.iter().map(|m| m.support).sum();
        let (precision, recall, f1) = self.macro_average();
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>6}  {:>8.2}  {:>7}",
            "accuracy",
            "",
            "",
            self.accuracy,
            total,
            width = width
        )?;
        writeln!(
            f,
            "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
            "macro avg",
            precision,
            recall,
            f1,
            total,
            width = width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let classes = labels(&["bridge", "squat"]);
        let truth = labels(&["squat", "squat", "bridge", "squat"]);
        let predicted = labels(&["squat", "bridge", "bridge", "squat"]);
        let matrix = confusion_matrix(&truth, &predicted, &classes).unwrap();

        assert_eq!(matrix[[0, 0]], 1); // bridge -> bridge
        assert_eq!(matrix[[1, 1]], 2); // squat -> squat
        assert_eq!(matrix[[1, 0]], 1); // squat -> bridge
        assert_eq!(matrix[[0, 1]], 0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let classes = labels(&["a"]);
        let err = confusion_matrix(&labels(&["a", "a"]), &labels(&["a"]), &classes).unwrap_err();
        assert!(format!("{}", err).contains("predictions"));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let classes = labels(&["a"]);
        assert!(confusion_matrix(&labels(&["b"]), &labels(&["a"]), &classes).is_err());
    }

    #[test]
    fn test_report_metrics() {
        let classes = labels(&["bridge", "squat"]);
        let truth = labels(&["squat", "squat", "bridge", "squat"]);
        let predicted = labels(&["squat", "bridge", "bridge", "squat"]);
        let report = ClassificationReport::from_predictions(&truth, &predicted, &classes).unwrap();

        assert!((report.accuracy - 0.75).abs() < 1e-6);
        let squat = &report.per_class[1];
        assert_eq!(squat.support, 3);
        assert!((squat.precision - 1.0).abs() < 1e-6);
        assert!((squat.recall - 2.0 / 3.0).abs() < 1e-6);

        let bridge = &report.per_class[0];
        assert!((bridge.precision - 0.5).abs() < 1e-6);
        assert!((bridge.recall - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fraction_matrix_rows_sum_to_one() {
        let classes = labels(&["a", "b"]);
        let truth = labels(&["a", "a", "b", "b"]);
        let predicted = labels(&["a", "b", "b", "b"]);
        let report = ClassificationReport::from_predictions(&truth, &predicted, &classes).unwrap();
        let fractions = report.fractions();
        for row in fractions.rows() {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_display_renders_table() {
        let classes = labels(&["bridge", "squat"]);
        let truth = labels(&["squat", "bridge"]);
        let predicted = labels(&["squat", "bridge"]);
        let report = ClassificationReport::from_predictions(&truth, &predicted, &classes).unwrap();
        let rendered = format!("{}", report);
        assert!(rendered.contains("precision"));
        assert!(rendered.contains("squat"));
        assert!(rendered.contains("macro avg"));
    }
}
