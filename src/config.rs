use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRADES_FILE: &str = "gradeCode.csv";
pub const DEFAULT_CLASSES_FILE: &str = "classCode.csv";
pub const DEFAULT_STUDENTS_FILE: &str = "students.csv";
pub const DEFAULT_SCORES_FILE: &str = "averageScores.csv";
pub const DEFAULT_SUBJECTS_FILE: &str = "subjects.csv";

/// Locations of the five input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub grades: PathBuf,
    pub classes: PathBuf,
    pub students: PathBuf,
    pub scores: PathBuf,
    pub subjects: PathBuf,
}

/// Per-table path overrides, stored as a JSON object on disk:
/// ```json
/// {
///   "scores": "exports/2024/averageScores.csv",
///   "students": "/srv/roster/students.csv"
/// }
/// ```
/// Relative paths are resolved against the data directory.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputOverrides {
    pub grades: Option<PathBuf>,
    pub classes: Option<PathBuf>,
    pub students: Option<PathBuf>,
    pub scores: Option<PathBuf>,
    pub subjects: Option<PathBuf>,
}

impl InputOverrides {
    /// Loads overrides from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input overrides {}", path.display()))?;
        let overrides = serde_json::from_str(&content)
            .with_context(|| format!("invalid input overrides {}", path.display()))?;
        Ok(overrides)
    }
}

impl InputFiles {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            grades: dir.join(DEFAULT_GRADES_FILE),
            classes: dir.join(DEFAULT_CLASSES_FILE),
            students: dir.join(DEFAULT_STUDENTS_FILE),
            scores: dir.join(DEFAULT_SCORES_FILE),
            subjects: dir.join(DEFAULT_SUBJECTS_FILE),
        }
    }

    /// Defaults inside `dir`, replaced by any path present in `overrides`.
    pub fn with_overrides(dir: &Path, overrides: InputOverrides) -> Self {
        let defaults = Self::in_dir(dir);
        let pick = |value: Option<PathBuf>, default: PathBuf| match value {
            Some(path) => dir.join(path),
            None => default,
        };
        Self {
            grades: pick(overrides.grades, defaults.grades),
            classes: pick(overrides.classes, defaults.classes),
            students: pick(overrides.students, defaults.students),
            scores: pick(overrides.scores, defaults.scores),
            subjects: pick(overrides.subjects, defaults.subjects),
        }
    }
}
