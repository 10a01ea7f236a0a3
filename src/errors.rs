//! Fatal load errors and row-level rejection diagnostics.
//!
//! A [`LoadError`] aborts the whole run: every later join depends on the
//! table that produced it. A [`Diagnostic`] records one skipped row and is
//! returned next to the stage result inside [`Staged`].

use serde::Serialize;
use std::fmt;

/// Errors that poison every downstream stage.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {table} table from {origin}: {source}")]
    Unreadable {
        table: TableKind,
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("{table} table is missing column {field} (accepted: {accepted}); headers seen: {seen}")]
    MissingColumn {
        table: TableKind,
        field: &'static str,
        accepted: String,
        seen: String,
    },
    #[error("{table} table yielded no usable rows")]
    Empty { table: TableKind },
    #[error("{table} table repeats code {code}")]
    DuplicateCode { table: TableKind, code: String },
    #[error("class {class_code} references unknown grade code {grade_code}")]
    DanglingGradeCode {
        class_code: String,
        grade_code: String,
    },
}

/// The five input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Grades,
    Classes,
    Students,
    Scores,
    Subjects,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Grades => "grade catalog",
            TableKind::Classes => "class catalog",
            TableKind::Students => "student roster",
            TableKind::Scores => "score records",
            TableKind::Subjects => "subject list",
        };
        f.write_str(name)
    }
}

/// Why a single row was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("required field {0} is empty")]
    MissingField(&'static str),
    #[error("semester {0:?} is not an integer")]
    InvalidSemester(String),
    #[error("score {0:?} is not a number")]
    InvalidScore(String),
    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(f64),
    #[error("no class code for class name {0:?}")]
    UnknownClass(String),
    #[error("no grade code for class code {0:?}")]
    UnknownClassGrade(String),
    #[error("no grade name for grade code {0:?}")]
    UnknownGrade(String),
    #[error("student {0} already appears earlier in the roster")]
    DuplicateStudent(String),
}

/// A rejected row with enough context to find and fix it in the source data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub table: TableKind,
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub academic_year: Option<String>,
    pub reason: RejectReason,
}

impl Diagnostic {
    pub fn new(table: TableKind, row: usize, reason: RejectReason) -> Self {
        Self {
            table,
            row,
            student_id: None,
            subject: None,
            academic_year: None,
            reason,
        }
    }

    pub fn with_student(mut self, student_id: &str) -> Self {
        if !student_id.is_empty() {
            self.student_id = Some(student_id.to_string());
        }
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        if !subject.is_empty() {
            self.subject = Some(subject.to_string());
        }
        self
    }

    pub fn with_year(mut self, year: &str) -> Self {
        if !year.is_empty() {
            self.academic_year = Some(year.to_string());
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}: {}", self.table, self.row, self.reason)?;
        if let Some(id) = &self.student_id {
            write!(f, " [student {id}]")?;
        }
        if let Some(subject) = &self.subject {
            write!(f, " [subject {subject}]")?;
        }
        if let Some(year) = &self.academic_year {
            write!(f, " [year {year}]")?;
        }
        Ok(())
    }
}

/// A stage result paired with the rows it rejected.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Staged<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Splits into the value and its diagnostics.
    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }
}
