// src/pipeline.rs
//! End-to-end batch analysis
//!
//! Wires the stages together in their standard order: catalog the data
//! directory, anonymize, screen for sensor quality, render diagnostics,
//! extract features, and optionally evaluate an external classifier on a
//! subject-disjoint split.

use std::path::Path;

use tracing::{info, warn};

use crate::classify::{split_by_person, ClassificationReport, Classifier};
use crate::config::AnalysisConfig;
use crate::error::AnalysisResult;
use crate::features::{extract_batch, FeatureMatrix, FeatureSet};
use crate::labeling::{anonymize, build_catalog, TrialEntry};
use crate::quality::screen_batch;

/// Fraction of subjects assigned to the training side of the split.
const TRAIN_SPLIT_FRACTION: f32 = 0.5;

/// What a full pipeline run produced.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Number of trials in the parsed catalog.
    pub n_cataloged: usize,
    /// Trials surviving the quality screen.
    pub kept: Vec<TrialEntry>,
    /// Number of trials the screen excluded.
    pub n_excluded: usize,
    /// Feature matrix over the surviving trials.
    pub features: FeatureMatrix,
    /// Classifier evaluation, when a classifier was supplied.
    pub report: Option<ClassificationReport>,
}

/// Run the full analysis over a data directory.
///
/// Intermediate records land under `out_dir`: `records/` for catalog
/// listings, `anonymized/` for renamed trial copies, `excluded/` for the
/// quality screen, `features.csv`, and plots when the `plotting` feature
/// is active.
pub fn run_analysis(
    config: &AnalysisConfig,
    base_dir: &Path,
    out_dir: &Path,
    classifier: Option<&mut dyn Classifier>,
) -> AnalysisResult<AnalysisOutcome> {
    config.validate()?;

    let catalog = build_catalog(base_dir, &out_dir.join("records"))?;
    let trials = anonymize(&catalog.trials, &out_dir.join("anonymized"))?;

    let outcome = screen_batch(&trials, &config.quality, &out_dir.join("excluded"))?;
    let kept = outcome.kept;

    // Diagnostics are best-effort: a failed render must not abort the batch.
    #[cfg(feature = "plotting")]
    {
        let metrics: Vec<crate::quality::QualityMetrics> =
            outcome.metrics.iter().map(|(_, m)| m.clone()).collect();
        if let Err(err) =
            crate::viz::plot_quality(&metrics, &config.plotting, &out_dir.join("quality.svg"))
        {
            warn!(%err, "skipping quality plot");
        }

        if config.plotting.render_trials {
            let plot_dir = out_dir.join("plots");
            std::fs::create_dir_all(&plot_dir)
                .map_err(|err| crate::error::AnalysisError::io(&plot_dir, err))?;
            for entry in &kept {
                let title = trial_title(entry);
                let recording = crate::ingest::load_recording(&entry.path)?;
                if let Err(err) = crate::viz::plot_trial(
                    &recording,
                    &title,
                    config.ingest.sample_rate_hz,
                    &config.plotting,
                    &plot_dir.join(format!("{}.svg", entry.file_id)),
                ) {
                    warn!(file_id = entry.file_id, %err, "skipping trial plot");
                }
            }
        }
    }

    let feature_set = FeatureSet::new(config);
    let features = extract_batch(&kept, &feature_set)?;
    features.write_csv(&out_dir.join("features.csv"))?;

    let report = match classifier {
        Some(classifier) => evaluate_classifier(config, &feature_set, &kept, classifier, out_dir)?,
        None => None,
    };

    Ok(AnalysisOutcome {
        n_cataloged: trials.len(),
        kept,
        n_excluded: outcome.excluded.len(),
        features,
        report,
    })
}

/// Fit and evaluate a classifier on a subject-disjoint split of the
/// surviving trials.
fn evaluate_classifier(
    config: &AnalysisConfig,
    feature_set: &FeatureSet,
    kept: &[TrialEntry],
    classifier: &mut dyn Classifier,
    out_dir: &Path,
) -> AnalysisResult<Option<ClassificationReport>> {
    let (train, test) = split_by_person(kept, TRAIN_SPLIT_FRACTION);
    if train.is_empty() || test.is_empty() {
        warn!(
            train = train.len(),
            test = test.len(),
            "not enough subjects for a disjoint split, skipping evaluation"
        );
        return Ok(None);
    }

    let train_features = extract_batch(&train, feature_set)?;
    let test_features = extract_batch(&test, feature_set)?;
    let train_labels: Vec<String> = train.iter().map(|e| e.exercise.clone()).collect();
    let test_labels: Vec<String> = test.iter().map(|e| e.exercise.clone()).collect();

    let mut classes: Vec<String> = train_labels
        .iter()
        .chain(test_labels.iter())
        .cloned()
        .collect();
    classes.sort();
    classes.dedup();

    classifier.fit(&train_features, &train_labels)?;
    let predicted = classifier.predict(&test_features)?;
    let report = ClassificationReport::from_predictions(&test_labels, &predicted, &classes)?;
    info!(accuracy = report.accuracy, "classifier evaluation complete");

    #[cfg(feature = "plotting")]
    if let Err(err) = crate::viz::plot_confusion(
        &report.fractions(),
        &report.classes,
        &config.plotting,
        &out_dir.join("confusion.svg"),
    ) {
        warn!(%err, "skipping confusion plot");
    }
    #[cfg(not(feature = "plotting"))]
    let _ = (config, out_dir);

    Ok(Some(report))
}

#[cfg_attr(not(feature = "plotting"), allow(dead_code))]
fn trial_title(entry: &TrialEntry) -> String {
    let side = entry
        .leg_side
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "file {} person {} {} {} trial {}",
        entry.file_id,
        entry.person_id,
        entry.exercise,
        side,
        entry.trial.map(|t| t.to_string()).unwrap_or_default()
    )
}
