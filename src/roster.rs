//! Roster normalizer.
//!
//! A student's current class is not read from the roster: it is the class of
//! their latest score record (greatest year, then greatest semester).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{Diagnostic, RejectReason, Staged, TableKind};
use crate::joiner::ScoreRecords;
use crate::models::{normalize_id, Gender, ScoreRecord, StudentProfile, UNASSIGNED_CLASS};
use crate::parser::StudentRow;

/// Student profiles keyed by normalized id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Roster {
    students: BTreeMap<String, StudentProfile>,
}

impl Roster {
    /// Normalizes the roster rows. Takes the joined records because current
    /// classes are derived from them.
    #[tracing::instrument(skip_all, fields(rows = rows.len(), records = scores.len()))]
    pub fn normalize(rows: &[StudentRow], scores: &ScoreRecords) -> Staged<Self> {
        let latest = latest_records(scores);
        let mut students = BTreeMap::new();
        let mut diagnostics = Vec::new();

        for row in rows {
            let id = normalize_id(&row.id);
            let name = row.name.trim();

            let reason = if id.is_empty() {
                Some(RejectReason::MissingField("id"))
            } else if name.is_empty() {
                Some(RejectReason::MissingField("name"))
            } else if students.contains_key(&id) {
                Some(RejectReason::DuplicateStudent(id.clone()))
            } else {
                None
            };
            if let Some(reason) = reason {
                let diag =
                    Diagnostic::new(TableKind::Students, row.number, reason).with_student(&id);
                warn!(%diag, "Roster row skipped");
                diagnostics.push(diag);
                continue;
            }

            let current_class = latest
                .get(id.as_str())
                .map(|r| r.class.clone())
                .unwrap_or_else(|| UNASSIGNED_CLASS.to_string());

            students.insert(
                id.clone(),
                StudentProfile {
                    id,
                    name: name.to_string(),
                    gender: Gender::from_alias(&row.gender),
                    current_class,
                },
            );
        }

        let unassigned = students.values().filter(|s| !s.is_assigned()).count();
        info!(
            students = students.len(),
            unassigned,
            rejected = diagnostics.len(),
            "Roster normalized"
        );

        Staged::new(Self { students }, diagnostics)
    }

    pub fn get(&self, id: &str) -> Option<&StudentProfile> {
        self.students.get(id)
    }

    /// Roster name, or `unknown` for ids not on the roster.
    pub fn display_name(&self, id: &str) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("unknown")
    }

    /// Gender from the roster; students not on the roster are `Unknown`.
    pub fn gender(&self, id: &str) -> Gender {
        self.get(id).map(|s| s.gender).unwrap_or(Gender::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudentProfile> {
        self.students.values()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Latest record per student: greatest year, ties broken by greatest
/// semester, first in input order on a full tie.
fn latest_records(scores: &ScoreRecords) -> BTreeMap<&str, &ScoreRecord> {
    let mut latest: BTreeMap<&str, &ScoreRecord> = BTreeMap::new();
    for record in scores {
        latest
            .entry(record.id.as_str())
            .and_modify(|current| {
                let newer = (record.academic_year.as_str(), record.semester)
                    > (current.academic_year.as_str(), current.semester);
                if newer {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joiner::records_for_test;

    fn record(id: &str, year: &str, semester: i32, class: &str) -> ScoreRecord {
        ScoreRecord {
            id: id.to_string(),
            academic_year: year.to_string(),
            semester,
            class: class.to_string(),
            grade_level: "Grade 7".to_string(),
            student_number: "1".to_string(),
            subject: "Math".to_string(),
            average_score: 70.0,
        }
    }

    fn student(number: usize, id: &str, name: &str, gender: &str) -> StudentRow {
        StudentRow {
            number,
            id: id.to_string(),
            name: name.to_string(),
            gender: gender.to_string(),
        }
    }

    #[test]
    fn test_later_year_wins_regardless_of_order() {
        let forward = records_for_test(vec![
            record("S01", "2023", 2, "7A"),
            record("S01", "2024", 1, "8A"),
        ]);
        let backward = records_for_test(vec![
            record("S01", "2024", 1, "8A"),
            record("S01", "2023", 2, "7A"),
        ]);
        let rows = vec![student(1, "s01", "Amy", "F")];

        for scores in [forward, backward] {
            let roster = Roster::normalize(&rows, &scores).value;
            assert_eq!(roster.get("S01").unwrap().current_class, "8A");
        }
    }

    #[test]
    fn test_semester_breaks_year_tie() {
        let scores = records_for_test(vec![
            record("S01", "2023", 2, "7B"),
            record("S01", "2023", 1, "7A"),
        ]);
        let roster = Roster::normalize(&[student(1, "S01", "Amy", "F")], &scores).value;
        assert_eq!(roster.get("S01").unwrap().current_class, "7B");
    }

    #[test]
    fn test_student_without_records_is_unassigned() {
        let roster = Roster::normalize(
            &[student(1, "S09", "Zed", "M")],
            &records_for_test(Vec::new()),
        )
        .value;
        let profile = roster.get("S09").unwrap();
        assert_eq!(profile.current_class, UNASSIGNED_CLASS);
        assert!(!profile.is_assigned());
        assert_eq!(profile.gender, Gender::Male);
    }

    #[test]
    fn test_rows_missing_id_or_name_are_skipped() {
        let rows = vec![
            student(1, "", "Nobody", "F"),
            student(2, "S02", " ", "F"),
            student(3, "S03", "Cal", "?"),
        ];
        let staged = Roster::normalize(&rows, &records_for_test(Vec::new()));

        assert_eq!(staged.value.len(), 1);
        assert_eq!(staged.value.gender("S03"), Gender::Unknown);
        assert_eq!(
            staged.diagnostics[0].reason,
            RejectReason::MissingField("id")
        );
        assert_eq!(
            staged.diagnostics[1].reason,
            RejectReason::MissingField("name")
        );
        assert_eq!(staged.diagnostics[1].student_id.as_deref(), Some("S02"));
    }

    #[test]
    fn test_duplicate_id_keeps_first_row() {
        let rows = vec![student(1, "S01", "Amy", "F"), student(2, "s01", "Amelia", "F")];
        let staged = Roster::normalize(&rows, &records_for_test(Vec::new()));

        assert_eq!(staged.value.get("S01").unwrap().name, "Amy");
        assert_eq!(
            staged.diagnostics[0].reason,
            RejectReason::DuplicateStudent("S01".to_string())
        );
    }

    #[test]
    fn test_display_name_falls_back_for_unknown_ids() {
        let roster = Roster::default();
        assert_eq!(roster.display_name("S77"), "unknown");
        assert_eq!(roster.gender("S77"), Gender::Unknown);
    }
}
