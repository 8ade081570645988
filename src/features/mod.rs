// src/features/mod.rs
//! EMG trial feature extraction
//!
//! One feature row per recording: the outlier-trimmed peak mean of every
//! channel, the dominant spectral frequencies of the trial, and the
//! cross-correlation phase lag of every channel against the reference.
//! Batches run per-file in parallel and collapse into a [`FeatureMatrix`].

pub mod peaks;
pub mod phase;
pub mod spectral;

pub use peaks::trimmed_peak_means;
pub use phase::phase_lags;
pub use spectral::{dominant_frequencies, magnitude_spectrum, MagnitudeSpectrum};

use std::path::Path;

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use tracing::info;

use crate::config::{AnalysisConfig, FeatureParams, IngestConfig};
use crate::error::{AnalysisError, AnalysisResult, ProcessingStage};
use crate::ingest::{load_recording, sample_segment, Recording, CHANNELS, CHANNEL_COUNT};
use crate::labeling::TrialEntry;

/// Configured extractor producing one feature row per recording.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    params: FeatureParams,
    ingest: IngestConfig,
}

impl FeatureSet {
    /// Build a feature set from the analysis configuration.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            params: config.features.clone(),
            ingest: config.ingest.clone(),
        }
    }

    /// Number of values in a feature row.
    pub fn width(&self) -> usize {
        2 * CHANNEL_COUNT + self.params.dominant_count
    }

    /// Stable column names: peak means per channel, `f1..fk`, then
    /// `p_<channel>` phase lags.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = CHANNELS.iter().map(|c| c.to_string()).collect();
        names.extend((1..=self.params.dominant_count).map(|i| format!("f{}", i)));
        names.extend(CHANNELS.iter().map(|c| format!("p_{}", c)));
        names
    }

    /// Extract one feature row from an in-memory recording.
    pub fn extract(&self, recording: &Recording) -> AnalysisResult<Vec<f32>> {
        let mut row =
            trimmed_peak_means(recording, self.params.peak_fraction, self.params.zscore_cutoff)?;
        let spectrum = magnitude_spectrum(recording, self.ingest.sample_rate_hz)?;
        row.extend(dominant_frequencies(&spectrum, self.params.dominant_count)?);
        let lags = phase_lags(recording, self.params.max_lag_fraction)?;
        row.extend(lags.iter().map(|&lag| lag as f32));
        Ok(row)
    }

    /// Load a recording from disk, cut the configured segment, and extract
    /// its feature row.
    pub fn extract_file(&self, path: &Path) -> AnalysisResult<Vec<f32>> {
        let recording = load_recording(path)?;
        let recording = match self.ingest.segment_seconds {
            Some(seconds) => sample_segment(&recording, seconds, self.ingest.sample_rate_hz)?,
            None => recording,
        };
        self.extract(&recording)
    }
}

/// Feature rows for a batch of files, with stable ids and column names.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    ids: Vec<usize>,
    columns: Vec<String>,
    data: Array2<f32>,
}

impl FeatureMatrix {
    /// Assemble a matrix from per-file rows.
    pub fn from_rows(
        ids: Vec<usize>,
        columns: Vec<String>,
        rows: Vec<Vec<f32>>,
    ) -> AnalysisResult<Self> {
        if ids.len() != rows.len() {
            return Err(AnalysisError::processing(
                ProcessingStage::Features,
                format!("{} ids for {} rows", ids.len(), rows.len()),
            ));
        }
        let width = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for (id, row) in ids.iter().zip(rows.iter()) {
            if row.len() != width {
                return Err(AnalysisError::processing(
                    ProcessingStage::Features,
                    format!("row for file {} has {} values, expected {}", id, row.len(), width),
                ));
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((ids.len(), width), flat).map_err(|err| {
            AnalysisError::processing(ProcessingStage::Features, err.to_string())
        })?;
        Ok(Self { ids, columns, data })
    }

    /// File ids, one per row.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The underlying `[n_files, n_features]` table.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// One feature row by position.
    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    /// Z-score every column in place using the sample standard deviation.
    /// Zero-variance columns become all-zero.
    pub fn standardize(&mut self) {
        let n = self.data.nrows();
        if n < 2 {
            self.data.fill(0.0);
            return;
        }
        for mut column in self.data.axis_iter_mut(Axis(1)) {
            let mean = column.iter().sum::<f32>() / n as f32;
            let variance =
                column.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / (n as f32 - 1.0);
            let std = variance.sqrt();
            if std == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|x| (x - mean) / std);
            }
        }
    }

    /// Write the matrix as CSV with a leading `file_id` column.
    pub fn write_csv(&self, path: &Path) -> AnalysisResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["file_id".to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;
        for (id, row) in self.ids.iter().zip(self.data.rows()) {
            let mut record = vec![id.to_string()];
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|err| AnalysisError::io(path, err))?;
        Ok(())
    }
}

/// Extract the feature matrix for a batch of cataloged trials.
///
/// Per-file work runs in parallel; the first failing file aborts the batch.
/// When the configuration asks for it, columns are standardized over the
/// batch after extraction.
pub fn extract_batch(
    entries: &[TrialEntry],
    feature_set: &FeatureSet,
) -> AnalysisResult<FeatureMatrix> {
    let rows: Vec<(usize, Vec<f32>)> = entries
        .par_iter()
        .map(|entry| Ok((entry.file_id, feature_set.extract_file(&entry.path)?)))
        .collect::<AnalysisResult<_>>()?;

    let (ids, rows): (Vec<usize>, Vec<Vec<f32>>) = rows.into_iter().unzip();
    let mut matrix = FeatureMatrix::from_rows(ids, feature_set.column_names(), rows)?;
    if feature_set.params.standardize {
        matrix.standardize();
    }
    info!(
        files = matrix.n_rows(),
        features = matrix.columns().len(),
        "extracted feature matrix"
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2 as Table;
    use std::path::PathBuf;

    fn feature_set() -> FeatureSet {
        FeatureSet::new(&AnalysisConfig::default())
    }

    #[test]
    fn test_column_names_are_stable() {
        let names = feature_set().column_names();
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "LGM");
        assert_eq!(names[8], "f1");
        assert_eq!(names[9], "f2");
        assert_eq!(names[10], "p_LGM");
        assert_eq!(names[17], "p_RVM");
    }

    #[test]
    fn test_extract_row_width_matches_columns() {
        let set = feature_set();
        let data = Table::from_shape_fn((600, CHANNEL_COUNT), |(row, ch)| {
            100.0 + ((row * (ch + 3)) % 17) as f32
        });
        let recording = Recording::new(PathBuf::from("test.csv"), data).unwrap();
        let row = set.extract(&recording).unwrap();
        assert_eq!(row.len(), set.width());
        assert_eq!(row.len(), set.column_names().len());
    }

    #[test]
    fn test_standardize_zeroes_constant_columns() {
        let mut matrix = FeatureMatrix::from_rows(
            vec![0, 1, 2],
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]],
        )
        .unwrap();
        matrix.standardize();

        // column a: mean 2, sample std 1
        assert!((matrix.data()[[0, 0]] + 1.0).abs() < 1e-6);
        assert!((matrix.data()[[2, 0]] - 1.0).abs() < 1e-6);
        // constant column b collapses to zero
        for row in 0..3 {
            assert_eq!(matrix.data()[[row, 1]], 0.0);
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FeatureMatrix::from_rows(
            vec![0, 1],
            vec!["a".to_string()],
            vec![vec![1.0], vec![1.0, 2.0]],
        );
        assert!(result.is_err());
    }
}
