// src/labeling/catalog.rs
//! Catalog construction over a trial data directory.
//!
//! A data directory holds one session folder per subject visit, each with
//! trial CSV files somewhere below it. The catalog lists both levels,
//! assigns stable numeric ids, joins them, and can anonymize the result by
//! copying every file to `<file_id>.csv`. Every listing pass writes a CSV
//! record of all items seen, parsed or not, before unparsed rows are
//! dropped.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::error::{AnalysisError, AnalysisResult};
use crate::labeling::patterns::{parse_csv_name, parse_folder_name, CsvLabel, FolderLabel, LegSide};

/// A labeled session folder.
#[derive(Debug, Clone)]
pub struct FolderEntry {
    /// Position of the folder in the sorted directory listing.
    pub folder_id: usize,
    /// Labels parsed from the folder name.
    pub label: FolderLabel,
    /// Absolute or base-relative folder path.
    pub path: PathBuf,
    /// Numeric subject id, assigned by first appearance.
    pub person_id: usize,
}

/// A labeled trial CSV file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Position of the file in the full scan across all folders.
    pub file_id: usize,
    /// Labels parsed from the file name.
    pub label: CsvLabel,
    /// Path of the CSV file.
    pub path: PathBuf,
    /// Id of the session folder the file was found under.
    pub folder_id: usize,
}

/// One row of the joined, anonymized trial table.
#[derive(Debug, Clone)]
pub struct TrialEntry {
    /// File id, also the anonymized file name.
    pub file_id: usize,
    /// Numeric subject id.
    pub person_id: usize,
    /// Trial number from the session folder, when present.
    pub trial: Option<u32>,
    /// Exercise name.
    pub exercise: String,
    /// Leg side, when tagged.
    pub leg_side: Option<LegSide>,
    /// Resistance setting, when tagged.
    pub resistance: Option<u32>,
    /// Path of the CSV file.
    pub path: PathBuf,
}

/// Folder and file tables for a data directory, plus their join.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Parsed session folders.
    pub folders: Vec<FolderEntry>,
    /// Parsed trial files.
    pub files: Vec<FileEntry>,
    /// Joined per-trial rows.
    pub trials: Vec<TrialEntry>,
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Label the session folders directly under `base`.
///
/// Dot-directories are skipped. The listing is sorted by name so folder and
/// person ids are stable across runs. A record of every listed folder is
/// written to `record_path`; only parsed folders are returned.
pub fn label_folders(base: &Path, record_path: &Path) -> AnalysisResult<Vec<FolderEntry>> {
    let mut listing: Vec<(String, PathBuf)> = Vec::new();
    let entries = fs::read_dir(base).map_err(|err| AnalysisError::io(base, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| AnalysisError::io(base, err))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() && !name.starts_with('.') {
            listing.push((name, path));
        }
    }
    listing.sort_by(|a, b| a.0.cmp(&b.0));

    let mut writer = csv::Writer::from_path(record_path)?;
    writer.write_record(["folder_id", "subject", "trial", "fitness", "push", "path", "parsed"])?;

    let mut person_ids: HashMap<String, usize> = HashMap::new();
    let mut folders = Vec::new();
    for (folder_id, (name, path)) in listing.iter().enumerate() {
        let label = parse_folder_name(name);
        match &label {
            Some(label) => writer.write_record([
                folder_id.to_string(),
                label.subject.clone(),
                opt(&label.trial),
                opt(&label.fitness),
                opt(&label.push),
                path.display().to_string(),
                "true".to_string(),
            ])?,
            None => writer.write_record([
                folder_id.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                path.display().to_string(),
                "false".to_string(),
            ])?,
        }
        if let Some(label) = label {
            let next_id = person_ids.len();
            let person_id = *person_ids.entry(label.subject.clone()).or_insert(next_id);
            folders.push(FolderEntry {
                folder_id,
                label,
                path: path.clone(),
                person_id,
            });
        }
    }
    writer.flush().map_err(|err| AnalysisError::io(record_path, err))?;

    info!(
        parsed = folders.len(),
        total = listing.len(),
        record = %record_path.display(),
        "labeled session folders"
    );
    Ok(folders)
}

/// Recursively scan one session folder for `*.csv` files.
///
/// Returns every file found with its parse result, sorted by path.
fn scan_trial_files(folder: &FolderEntry) -> AnalysisResult<Vec<(PathBuf, Option<CsvLabel>)>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(&folder.path).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| folder.path.clone());
            AnalysisError::Io {
                path,
                source: err.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        found.push((entry.path().to_path_buf(), parse_csv_name(&name)));
    }
    Ok(found)
}

/// Build the full catalog for a data directory.
///
/// Writes `folders.csv` and `files.csv` records under `record_dir` and
/// returns the parsed tables plus their join on folder id.
pub fn build_catalog(base: &Path, record_dir: &Path) -> AnalysisResult<Catalog> {
    fs::create_dir_all(record_dir).map_err(|err| AnalysisError::io(record_dir, err))?;

    let folders = label_folders(base, &record_dir.join("folders.csv"))?;

    let record_path = record_dir.join("files.csv");
    let mut writer = csv::Writer::from_path(&record_path)?;
    writer.write_record([
        "file_id", "subject", "exercise", "leg_side", "resistance", "suffix", "path", "folder_id",
        "parsed",
    ])?;

    let mut files = Vec::new();
    let mut file_id = 0usize;
    let mut scanned = 0usize;
    for folder in &folders {
        for (path, label) in scan_trial_files(folder)? {
            scanned += 1;
            match &label {
                Some(label) => writer.write_record([
                    file_id.to_string(),
                    label.subject.clone(),
                    label.exercise.clone(),
                    opt(&label.leg_side),
                    opt(&label.resistance),
                    label.suffix.clone(),
                    path.display().to_string(),
                    folder.folder_id.to_string(),
                    "true".to_string(),
                ])?,
                None => writer.write_record([
                    file_id.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    path.display().to_string(),
                    folder.folder_id.to_string(),
                    "false".to_string(),
                ])?,
            }
            if let Some(label) = label {
                files.push(FileEntry {
                    file_id,
                    label,
                    path,
                    folder_id: folder.folder_id,
                });
            }
            file_id += 1;
        }
    }
    writer.flush().map_err(|err| AnalysisError::io(&record_path, err))?;

    let by_folder: HashMap<usize, &FolderEntry> =
        folders.iter().map(|f| (f.folder_id, f)).collect();
    let trials = files
        .iter()
        .filter_map(|file| {
            by_folder.get(&file.folder_id).map(|folder| TrialEntry {
                file_id: file.file_id,
                person_id: folder.person_id,
                trial: folder.label.trial,
                exercise: file.label.exercise.clone(),
                leg_side: file.label.leg_side,
                resistance: file.label.resistance,
                path: file.path.clone(),
            })
        })
        .collect::<Vec<_>>();

    info!(
        files = files.len(),
        scanned,
        folders = folders.len(),
        "built trial catalog"
    );
    Ok(Catalog {
        folders,
        files,
        trials,
    })
}

/// Copy every trial file to `dest/<file_id>.csv` and drop subject names.
///
/// The destination directory is recreated from scratch. Returns the trial
/// table with rewritten paths; an index of the copies is written to
/// `dest/trials.csv`.
pub fn anonymize(trials: &[TrialEntry], dest: &Path) -> AnalysisResult<Vec<TrialEntry>> {
    match fs::remove_dir_all(dest) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(AnalysisError::io(dest, err)),
    }
    fs::create_dir_all(dest).map_err(|err| AnalysisError::io(dest, err))?;

    let record_path = dest.join("trials.csv");
    let mut writer = csv::Writer::from_path(&record_path)?;
    writer.write_record(["file_id", "person_id", "trial", "exercise", "leg_side", "resistance"])?;

    let mut renamed = Vec::with_capacity(trials.len());
    for trial in trials {
        let target = dest.join(format!("{}.csv", trial.file_id));
        fs::copy(&trial.path, &target).map_err(|err| AnalysisError::io(&trial.path, err))?;
        writer.write_record([
            trial.file_id.to_string(),
            trial.person_id.to_string(),
            opt(&trial.trial),
            trial.exercise.clone(),
            opt(&trial.leg_side),
            opt(&trial.resistance),
        ])?;
        renamed.push(TrialEntry {
            path: target,
            ..trial.clone()
        });
    }
    writer.flush().map_err(|err| AnalysisError::io(&record_path, err))?;

    info!(copied = renamed.len(), dest = %dest.display(), "anonymized trial files");
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dirs(base: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir_all(base.join(name)).unwrap();
        }
    }

    #[test]
    fn test_person_ids_follow_first_appearance() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");
        make_dirs(
            &base,
            &[
                "Ann_Lee_Calib_Trial1_Fitness1_Push1",
                "Ann_Lee_Calib_Trial2_Fitness1_Push1",
                "Bob_Ray_Calib_Trial1_Fitness2_Push1",
                ".hidden",
                "scratch",
            ],
        );

        let record = dir.path().join("folders.csv");
        let folders = label_folders(&base, &record).unwrap();

        assert_eq!(folders.len(), 3);
        assert_eq!(folders[0].person_id, folders[1].person_id);
        assert_ne!(folders[0].person_id, folders[2].person_id);
        assert!(record.exists());
    }

    #[test]
    fn test_unparsed_folders_recorded_but_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");
        make_dirs(&base, &["Ann_Lee_Calib_Trial1_Fitness1_Push1", "plots"]);

        let record = dir.path().join("folders.csv");
        let folders = label_folders(&base, &record).unwrap();
        assert_eq!(folders.len(), 1);

        let recorded = fs::read_to_string(&record).unwrap();
        assert!(recorded.contains("plots"));
        assert!(recorded.contains("false"));
    }
}
