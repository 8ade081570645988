// src/quality/screen.rs
//! Batch quality screening over a trial catalog.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::config::QualityThresholds;
use crate::error::{AnalysisError, AnalysisResult};
use crate::ingest::load_recording;
use crate::labeling::TrialEntry;
use crate::quality::{quality_metrics, screen, QualityFlag, QualityMetrics};

/// Result of screening a catalog.
#[derive(Debug, Clone)]
pub struct ScreenOutcome {
    /// Trials that passed every check.
    pub kept: Vec<TrialEntry>,
    /// Trials that failed, with the flags they tripped.
    pub excluded: Vec<(TrialEntry, Vec<QualityFlag>)>,
    /// Metrics for every screened trial, in catalog order.
    pub metrics: Vec<(usize, QualityMetrics)>,
}

/// Screen every trial in the catalog against the thresholds.
///
/// Metrics are computed per file in parallel. `record_dir` is recreated
/// and receives one CSV per flag category listing the excluded files, so
/// there is a reviewable record of everything dropped.
pub fn screen_batch(
    entries: &[TrialEntry],
    thresholds: &QualityThresholds,
    record_dir: &Path,
) -> AnalysisResult<ScreenOutcome> {
    let screened: Vec<(TrialEntry, QualityMetrics, Vec<QualityFlag>)> = entries
        .par_iter()
        .map(|entry| {
            let recording = load_recording(&entry.path)?;
            let metrics = quality_metrics(&recording);
            let flags = screen(&metrics, thresholds);
            Ok((entry.clone(), metrics, flags))
        })
        .collect::<AnalysisResult<_>>()?;

    match fs::remove_dir_all(record_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(AnalysisError::io(record_dir, err)),
    }
    fs::create_dir_all(record_dir).map_err(|err| AnalysisError::io(record_dir, err))?;

    for flag in QualityFlag::ALL {
        let record_path = record_dir.join(format!("{}.csv", flag.record_name()));
        let mut writer = csv::Writer::from_path(&record_path)?;
        writer.write_record([
            "file_id",
            "path",
            "length",
            "max",
            "median",
            "n_spikes",
            "max_frac_zero",
            "max_frac_repeat",
        ])?;
        for (entry, metrics, flags) in &screened {
            if !flags.contains(&flag) {
                continue;
            }
            writer.write_record([
                entry.file_id.to_string(),
                entry.path.display().to_string(),
                metrics.length.to_string(),
                metrics.max_in_range.to_string(),
                metrics.median.to_string(),
                metrics.spike_count.to_string(),
                metrics.max_zero_frac.to_string(),
                metrics.max_repeat_frac.to_string(),
            ])?;
        }
        writer.flush().map_err(|err| AnalysisError::io(&record_path, err))?;
    }

    let mut outcome = ScreenOutcome {
        kept: Vec::new(),
        excluded: Vec::new(),
        metrics: Vec::new(),
    };
    for (entry, metrics, flags) in screened {
        outcome.metrics.push((entry.file_id, metrics));
        if flags.is_empty() {
            outcome.kept.push(entry);
        } else {
            outcome.excluded.push((entry, flags));
        }
    }

    info!(
        excluded = outcome.excluded.len(),
        total = entries.len(),
        record = %record_dir.display(),
        "quality screen complete"
    );
    Ok(outcome)
}
