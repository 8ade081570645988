// src/classify/mod.rs
//! Exercise classifier evaluation
//!
//! Classification itself is delegated to an external implementation behind
//! the [`Classifier`] trait; this module owns the subject-disjoint
//! train/test split and the evaluation report.

pub mod evaluation;

pub use evaluation::{confusion_matrix, fraction_matrix, ClassMetrics, ClassificationReport};

use tracing::info;

use crate::error::AnalysisResult;
use crate::features::FeatureMatrix;
use crate::labeling::TrialEntry;

/// External exercise classifier.
///
/// Implementations wrap whatever model library the lab uses; the pipeline
/// only needs fit and predict over feature matrices.
pub trait Classifier {
    /// Train on a feature matrix with one label per row.
    fn fit(&mut self, features: &FeatureMatrix, labels: &[String]) -> AnalysisResult<()>;

    /// Predict one label per row of the feature matrix.
    fn predict(&self, features: &FeatureMatrix) -> AnalysisResult<Vec<String>>;
}

/// Split trials into two subject-disjoint parts by person id.
///
/// Subjects with `person_id` below `frac * n_persons` land on the left,
/// the rest on the right, so no subject contributes to both sides.
pub fn split_by_person(entries: &[TrialEntry], frac: f32) -> (Vec<TrialEntry>, Vec<TrialEntry>) {
    let mut person_ids: Vec<usize> = entries.iter().map(|e| e.person_id).collect();
    person_ids.sort_unstable();
    person_ids.dedup();
    let cut = (frac * person_ids.len() as f32) as usize;

    let (left, right) = entries
        .iter()
        .cloned()
        .partition(|entry| entry.person_id < cut);
    info!(cut, persons = person_ids.len(), "split catalog by person id");
    (left, right)
}
