// src/ingest/csv_source.rs
//! CSV loading for per-trial EMG recordings.
//!
//! Trial files carry one header row and one column per electrode. Only the
//! eight canonical muscle channels are kept, reordered to [`CHANNELS`]
//! regardless of their order in the file; any extra columns are dropped.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use ndarray::{Array2, ArrayView1};

use crate::error::{AnalysisError, AnalysisResult};

/// Canonical channel order: left then right, glut, hamstring, lateral and
/// medial quad.
pub const CHANNELS: [&str; 8] = ["LGM", "LBF", "LVL", "LVM", "RGM", "RBF", "RVL", "RVM"];

/// Number of muscle channels in a recording.
pub const CHANNEL_COUNT: usize = CHANNELS.len();

/// A single trial recording: `[n_samples, CHANNEL_COUNT]` in canonical
/// channel order.
#[derive(Debug, Clone)]
pub struct Recording {
    path: PathBuf,
    data: Array2<f32>,
}

impl Recording {
    /// Wrap an already-built sample table.
    ///
    /// Rejects tables whose column count does not match [`CHANNEL_COUNT`].
    pub fn new(path: PathBuf, data: Array2<f32>) -> AnalysisResult<Self> {
        if data.ncols() != CHANNEL_COUNT {
            return Err(AnalysisError::invalid_recording(
                &path,
                format!("expected {} channels, got {}", CHANNEL_COUNT, data.ncols()),
            ));
        }
        Ok(Self { path, data })
    }

    /// Source path of the recording.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// True when the recording holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// The full sample table.
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// One channel by canonical index.
    pub fn channel(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.column(index)
    }

    /// One channel by name, if it is a canonical channel.
    pub fn channel_by_name(&self, name: &str) -> Option<ArrayView1<'_, f32>> {
        CHANNELS
            .iter()
            .position(|&c| c == name)
            .map(|ix| self.data.column(ix))
    }
}

/// Load a trial recording from a CSV file.
pub fn load_recording(path: &Path) -> AnalysisResult<Recording> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => {}
        other => {
            return Err(AnalysisError::invalid_recording(
                path,
                format!("extension must be .csv, not {:?}", other.unwrap_or("")),
            ));
        }
    }

    let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mut indices = [0usize; CHANNEL_COUNT];
    for (slot, name) in indices.iter_mut().zip(CHANNELS.iter()) {
        *slot = headers
            .iter()
            .position(|header| header == *name)
            .ok_or_else(|| {
                AnalysisError::invalid_recording(path, format!("missing channel column {:?}", name))
            })?;
    }

    let mut values: Vec<f32> = Vec::new();
    let mut n_rows = 0usize;
    for record in reader.records() {
        let record = record?;
        for (&column, name) in indices.iter().zip(CHANNELS.iter()) {
            let cell = record.get(column).ok_or_else(|| {
                AnalysisError::invalid_recording(
                    path,
                    format!("row {} is missing column {:?}", n_rows + 1, name),
                )
            })?;
            let value: f32 = cell.parse().map_err(|_| {
                AnalysisError::invalid_recording(
                    path,
                    format!("unparsable value {:?} in column {:?}", cell, name),
                )
            })?;
            values.push(value);
        }
        n_rows += 1;
    }

    let data = Array2::from_shape_vec((n_rows, CHANNEL_COUNT), values).map_err(|err| {
        AnalysisError::invalid_recording(path, format!("malformed sample table: {}", err))
    })?;
    Recording::new(path.to_path_buf(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_reorders_columns() {
        let dir = tempfile::tempdir().unwrap();
        // canonical order is LGM first; file puts RVM first plus a stray column
        let path = write_csv(
            &dir,
            "trial.csv",
            "RVM,Time,LGM,LBF,LVL,LVM,RGM,RBF,RVL\n\
             8,0.0,1,2,3,4,5,6,7\n\
             80,0.1,10,20,30,40,50,60,70\n",
        );

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.len(), 2);
        assert_eq!(recording.data()[[0, 0]], 1.0); // LGM
        assert_eq!(recording.data()[[0, 7]], 8.0); // RVM
        assert_eq!(recording.data()[[1, 4]], 50.0); // RGM
    }

    #[test]
    fn test_channel_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "trial.csv",
            "LGM,LBF,LVL,LVM,RGM,RBF,RVL,RVM\n1,2,3,4,5,6,7,8\n",
        );
        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.channel_by_name("RBF").unwrap()[0], 6.0);
        assert!(recording.channel_by_name("ECG").is_none());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let err = load_recording(Path::new("trial.txt")).unwrap_err();
        assert!(format!("{}", err).contains(".csv"));
    }

    #[test]
    fn test_rejects_missing_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "trial.csv", "LGM,LBF\n1,2\n");
        let err = load_recording(&path).unwrap_err();
        assert!(format!("{}", err).contains("LVL"));
    }

    #[test]
    fn test_rejects_unparsable_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "trial.csv",
            "LGM,LBF,LVL,LVM,RGM,RBF,RVL,RVM\n1,2,x,4,5,6,7,8\n",
        );
        let err = load_recording(&path).unwrap_err();
        assert!(format!("{}", err).contains("LVL"));
    }

    #[test]
    fn test_empty_body_loads_as_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "trial.csv", "LGM,LBF,LVL,LVM,RGM,RBF,RVL,RVM\n");
        let recording = load_recording(&path).unwrap();
        assert!(recording.is_empty());
    }
}
