//! Runs the load → catalog → join → roster → subjects stages in order.
//!
//! The result is an immutable [`ReportData`]; aggregates are computed from it
//! on demand by [`crate::analyzers`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::catalog::{ClassCatalog, GradeCatalog, ReferenceCatalogs};
use crate::config::InputFiles;
use crate::errors::{Diagnostic, LoadError, TableKind};
use crate::joiner::{join_scores, ScoreRecords};
use crate::parser::{load_table, ClassRow, GradeRow, ScoreRow, StudentRow, SubjectRow};
use crate::roster::Roster;
use crate::subjects::SubjectCatalog;

/// Raw rows of every input table.
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub grades: Vec<GradeRow>,
    pub classes: Vec<ClassRow>,
    pub students: Vec<StudentRow>,
    pub scores: Vec<ScoreRow>,
    pub subjects: Vec<SubjectRow>,
}

impl InputTables {
    /// Reads all five tables. Any unreadable table or missing column aborts.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] encountered.
    #[tracing::instrument(skip_all)]
    pub fn load(files: &InputFiles) -> Result<Self, LoadError> {
        Ok(Self {
            grades: load_table(&files.grades)?,
            classes: load_table(&files.classes)?,
            students: load_table(&files.students)?,
            scores: load_table(&files.scores)?,
            subjects: load_table(&files.subjects)?,
        })
    }
}

/// Every stage output of one run.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub catalogs: ReferenceCatalogs,
    pub records: ScoreRecords,
    pub roster: Roster,
    pub subjects: SubjectCatalog,
    pub years: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReportData {
    pub fn grade_order(&self) -> &[String] {
        self.catalogs.grades.order()
    }

    pub fn class_order(&self) -> &[String] {
        self.catalogs.classes.order()
    }

    pub fn subject_order(&self) -> &[String] {
        self.subjects.order()
    }

    /// Number of rejected rows per table.
    pub fn diagnostic_counts(&self) -> Vec<(TableKind, usize)> {
        [
            TableKind::Grades,
            TableKind::Classes,
            TableKind::Students,
            TableKind::Scores,
            TableKind::Subjects,
        ]
        .into_iter()
        .map(|table| {
            let count = self.diagnostics.iter().filter(|d| d.table == table).count();
            (table, count)
        })
        .collect()
    }

    /// Serializable view handed to the presentation layer.
    pub fn payload(&self) -> ReportPayload<'_> {
        ReportPayload {
            generated_at: Utc::now(),
            records: &self.records,
            students: &self.roster,
            grades: &self.catalogs.grades,
            classes: &self.catalogs.classes,
            grade_order: self.grade_order(),
            class_order: self.class_order(),
            subjects: &self.subjects,
            subject_order: self.subject_order(),
            years: &self.years,
        }
    }
}

/// The report payload: normalized data only, no precomputed aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload<'a> {
    pub generated_at: DateTime<Utc>,
    pub records: &'a ScoreRecords,
    pub students: &'a Roster,
    pub grades: &'a GradeCatalog,
    pub classes: &'a ClassCatalog,
    pub grade_order: &'a [String],
    pub class_order: &'a [String],
    pub subjects: &'a SubjectCatalog,
    pub subject_order: &'a [String],
    pub years: &'a [String],
}

/// Runs every stage over already-read tables.
///
/// # Errors
///
/// Only catalog failures are fatal; row problems end up in
/// [`ReportData::diagnostics`].
#[tracing::instrument(skip_all)]
pub fn run(tables: &InputTables) -> Result<ReportData, LoadError> {
    let (catalogs, mut diagnostics) =
        ReferenceCatalogs::resolve(&tables.grades, &tables.classes)?.into_parts();

    let (records, score_diagnostics) = join_scores(&tables.scores, &catalogs).into_parts();
    diagnostics.extend(score_diagnostics);

    let (roster, roster_diagnostics) = Roster::normalize(&tables.students, &records).into_parts();
    diagnostics.extend(roster_diagnostics);

    let (subjects, subject_diagnostics) = SubjectCatalog::from_rows(&tables.subjects).into_parts();
    diagnostics.extend(subject_diagnostics);

    let years = records.years();
    info!(
        records = records.len(),
        students = roster.len(),
        years = years.len(),
        rejected = diagnostics.len(),
        "Pipeline complete"
    );

    Ok(ReportData {
        catalogs,
        records,
        roster,
        subjects,
        years,
        diagnostics,
    })
}

/// Loads the tables from disk and runs the pipeline.
///
/// # Errors
///
/// Returns any fatal [`LoadError`].
pub fn run_files(files: &InputFiles) -> Result<ReportData, LoadError> {
    let tables = InputTables::load(files)?;
    run(&tables)
}
