// src/labeling/patterns.rs
//! Filename and folder-name label patterns.
//!
//! Session folders look like `First_Last_Calib..._Trial1_Fitness2_Push3`
//! (an optional middle name is tolerated). Trial files look like
//! `LastFirst_ExerciseL2.csv` with an optional leg-side tag, resistance
//! number and short free-form suffix; a relaxed second pass accepts files
//! where the leg side is missing and the suffix runs longer.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Labels parsed from a session folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLabel {
    /// Subject name as written in the folder name, underscore-joined.
    pub subject: String,
    /// Trial number, when present in the name.
    pub trial: Option<u32>,
    /// Fitness level, when present in the name.
    pub fitness: Option<u32>,
    /// Push level, when present in the name.
    pub push: Option<u32>,
}

/// Leg side encoded in a trial file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSide {
    /// Left-leg trial.
    Left,
    /// Right-leg trial.
    Right,
}

impl LegSide {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "L" => Some(LegSide::Left),
            "R" => Some(LegSide::Right),
            _ => None,
        }
    }
}

impl fmt::Display for LegSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegSide::Left => write!(f, "L"),
            LegSide::Right => write!(f, "R"),
        }
    }
}

/// Labels parsed from a trial CSV file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLabel {
    /// Subject name as written in the file name.
    pub subject: String,
    /// Exercise name.
    pub exercise: String,
    /// Leg side, when tagged.
    pub leg_side: Option<LegSide>,
    /// Resistance setting, when tagged.
    pub resistance: Option<u32>,
    /// Trailing free-form suffix, possibly empty.
    pub suffix: String,
}

fn folder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([a-zA-Z]*_(?:[a-zA-Z]*_)?[a-zA-Z]*)[_ ]Calib.*[_ ]Trial(\d*)[_ ]Fitness(\d*)[_ ]Push(\d*)$",
        )
        .expect("folder pattern is valid")
    })
}

fn csv_pattern_strict() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z ]+)(?:_| _)([A-Za-z]+)_?([LR])(\d*)(.{0,4})\.csv$")
            .expect("strict csv pattern is valid")
    })
}

fn csv_pattern_relaxed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z ]+)(?:_| _)([A-Za-z]+)_?([LR])?(\d*)(.{0,8})\.csv$")
            .expect("relaxed csv pattern is valid")
    })
}

fn number(capture: Option<regex::Match<'_>>) -> Option<u32> {
    capture.and_then(|m| m.as_str().parse().ok())
}

/// Parse subject and trial/fitness/push numbers from a session folder name.
pub fn parse_folder_name(name: &str) -> Option<FolderLabel> {
    let caps = folder_pattern().captures(name)?;
    Some(FolderLabel {
        subject: caps[1].to_string(),
        trial: number(caps.get(2)),
        fitness: number(caps.get(3)),
        push: number(caps.get(4)),
    })
}

/// Parse subject, exercise, leg side, resistance and suffix from a trial
/// file name. Tries the strict pattern first, then the relaxed one.
pub fn parse_csv_name(name: &str) -> Option<CsvLabel> {
    let caps = csv_pattern_strict()
        .captures(name)
        .or_else(|| csv_pattern_relaxed().captures(name))?;
    Some(CsvLabel {
        subject: caps[1].to_string(),
        exercise: caps[2].to_string(),
        leg_side: caps.get(3).and_then(|m| LegSide::from_tag(m.as_str())),
        resistance: number(caps.get(4)),
        suffix: caps.get(5).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}
