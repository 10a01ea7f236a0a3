//! Score record joiner.
//!
//! Turns raw score rows into [`ScoreRecord`]s by resolving each row's
//! class → grade chain against the reference catalogs. Bad rows are skipped
//! with a [`Diagnostic`]; the batch always completes.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::ReferenceCatalogs;
use crate::errors::{Diagnostic, RejectReason, Staged, TableKind};
use crate::models::{normalize_id, ScoreRecord};
use crate::parser::ScoreRow;

/// The joined score records, in input order.
///
/// Only [`join_scores`] can build this, so anything taking `&ScoreRecords`
/// necessarily runs after the join. There is no empty or default value:
///
/// ```compile_fail
/// let _ = school_score_report::joiner::ScoreRecords::default();
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ScoreRecords {
    records: Vec<ScoreRecord>,
}

impl ScoreRecords {
    pub fn as_slice(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoreRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records belonging to one student.
    pub fn for_student<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.records.iter().filter(move |r| r.id == id)
    }

    /// Sorted distinct academic years.
    pub fn years(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.academic_year.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<'a> IntoIterator for &'a ScoreRecords {
    type Item = &'a ScoreRecord;
    type IntoIter = std::slice::Iter<'a, ScoreRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Joins every score row against the catalogs.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn join_scores(rows: &[ScoreRow], catalogs: &ReferenceCatalogs) -> Staged<ScoreRecords> {
    let mut records = Vec::with_capacity(rows.len());
    let mut diagnostics = Vec::new();

    for row in rows {
        match join_row(row, catalogs) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let diag = Diagnostic::new(TableKind::Scores, row.number, reason)
                    .with_student(&normalize_id(&row.id))
                    .with_subject(&row.subject)
                    .with_year(&row.academic_year);
                warn!(%diag, "Score row skipped");
                diagnostics.push(diag);
            }
        }
    }

    info!(
        joined = records.len(),
        rejected = diagnostics.len(),
        "Score records joined"
    );

    Staged::new(ScoreRecords { records }, diagnostics)
}

fn join_row(row: &ScoreRow, catalogs: &ReferenceCatalogs) -> Result<ScoreRecord, RejectReason> {
    let id = normalize_id(&row.id);

    let required = [
        ("id", id.as_str()),
        ("academic_year", row.academic_year.as_str()),
        ("semester", row.semester.as_str()),
        ("class_name", row.class_name.as_str()),
        ("student_number", row.student_number.as_str()),
        ("subject", row.subject.as_str()),
        ("average_score", row.average_score.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(RejectReason::MissingField(*field));
    }

    let semester: i32 = row
        .semester
        .parse()
        .map_err(|_| RejectReason::InvalidSemester(row.semester.clone()))?;

    let score: f64 = row
        .average_score
        .parse()
        .ok()
        .filter(|s: &f64| s.is_finite())
        .ok_or_else(|| RejectReason::InvalidScore(row.average_score.clone()))?;
    if !(0.0..=100.0).contains(&score) {
        return Err(RejectReason::ScoreOutOfRange(score));
    }

    let grade_level = catalogs.grade_for_class(&row.class_name)?;

    Ok(ScoreRecord {
        id,
        academic_year: row.academic_year.clone(),
        semester,
        class: row.class_name.clone(),
        grade_level: grade_level.to_string(),
        student_number: row.student_number.clone(),
        subject: row.subject.clone(),
        average_score: score,
    })
}

/// Builds records directly, bypassing the join. Test fixtures only.
#[cfg(test)]
pub(crate) fn records_for_test(records: Vec<ScoreRecord>) -> ScoreRecords {
    ScoreRecords { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ClassRow, GradeRow};

    fn catalogs() -> ReferenceCatalogs {
        let grades = vec![GradeRow {
            number: 1,
            grade_name: "Grade 7".to_string(),
            grade_code: "G7".to_string(),
        }];
        let classes = vec![ClassRow {
            number: 1,
            class_name: "7A".to_string(),
            class_code: "C7A".to_string(),
            grade_code: "G7".to_string(),
        }];
        ReferenceCatalogs::resolve(&grades, &classes).unwrap().value
    }

    fn row(number: usize, class_name: &str, semester: &str, score: &str) -> ScoreRow {
        ScoreRow {
            number,
            id: " s01 ".to_string(),
            academic_year: "2023".to_string(),
            semester: semester.to_string(),
            class_name: class_name.to_string(),
            student_number: "3".to_string(),
            subject: "Math".to_string(),
            average_score: score.to_string(),
        }
    }

    #[test]
    fn test_join_resolves_grade_and_normalizes_id() {
        let staged = join_scores(&[row(1, "7A", "1", "88.5")], &catalogs());

        assert!(staged.diagnostics.is_empty());
        let record = &staged.value.as_slice()[0];
        assert_eq!(record.id, "S01");
        assert_eq!(record.grade_level, "Grade 7");
        assert_eq!(record.semester, 1);
        assert_eq!(record.average_score, 88.5);
    }

    #[test]
    fn test_bad_rows_are_skipped_not_fatal() {
        let rows = vec![
            row(1, "7A", "1", "70"),
            row(2, "9Z", "1", "70"),
            row(3, "7A", "first", "70"),
            row(4, "7A", "1", "abc"),
            row(5, "7A", "1", ""),
            row(6, "7A", "2", "101"),
            row(7, "7A", "2", "80"),
        ];
        let staged = join_scores(&rows, &catalogs());

        assert_eq!(staged.value.len(), 2);
        let reasons: Vec<_> = staged.diagnostics.iter().map(|d| d.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::UnknownClass("9Z".to_string()),
                RejectReason::InvalidSemester("first".to_string()),
                RejectReason::InvalidScore("abc".to_string()),
                RejectReason::MissingField("average_score"),
                RejectReason::ScoreOutOfRange(101.0),
            ]
        );
        assert_eq!(staged.diagnostics[0].row, 2);
        assert_eq!(staged.diagnostics[0].student_id.as_deref(), Some("S01"));
        assert_eq!(staged.diagnostics[0].subject.as_deref(), Some("Math"));
        assert_eq!(staged.diagnostics[0].academic_year.as_deref(), Some("2023"));
    }

    #[test]
    fn test_nan_score_is_rejected() {
        let staged = join_scores(&[row(1, "7A", "1", "NaN")], &catalogs());
        assert!(staged.value.is_empty());
        assert_eq!(
            staged.diagnostics[0].reason,
            RejectReason::InvalidScore("NaN".to_string())
        );
    }

    #[test]
    fn test_join_preserves_input_order() {
        let mut second = row(2, "7A", "2", "60");
        second.subject = "English".to_string();
        let staged = join_scores(&[row(1, "7A", "1", "90"), second], &catalogs());

        let subjects: Vec<_> = staged.value.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Math", "English"]);
    }

    #[test]
    fn test_empty_table_joins_to_empty_collection() {
        let staged = join_scores(&[], &catalogs());
        assert!(staged.value.is_empty());
        assert!(staged.diagnostics.is_empty());
        assert!(staged.value.years().is_empty());
    }

    #[test]
    fn test_years_are_sorted_and_distinct() {
        let mut a = row(1, "7A", "1", "50");
        a.academic_year = "2024".to_string();
        let b = row(2, "7A", "1", "50");
        let c = row(3, "7A", "2", "50");
        let staged = join_scores(&[a, b, c], &catalogs());
        assert_eq!(staged.value.years(), vec!["2023", "2024"]);
    }
}
