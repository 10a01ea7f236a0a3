//! Drill-down from a year to a class to one student's per-subject history.

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::trend::yearly_series;
use crate::analyzers::types::{ClassStudent, StudentTrack};
use crate::analyzers::utility::min_max;
use crate::joiner::ScoreRecords;
use crate::models::{normalize_id, student_number_key};
use crate::roster::Roster;

/// Classes with records in `year`, in `class_order`.
pub fn classes_in_year(records: &ScoreRecords, class_order: &[String], year: &str) -> Vec<String> {
    let present: BTreeSet<&str> = records
        .iter()
        .filter(|r| r.academic_year == year)
        .map(|r| r.class.as_str())
        .collect();
    class_order
        .iter()
        .filter(|class| present.contains(class.as_str()))
        .cloned()
        .collect()
}

/// Roster students with records in `year` and `class`, by numeric student
/// number. Ids missing from the roster are not listed.
pub fn students_in_class(
    records: &ScoreRecords,
    roster: &Roster,
    year: &str,
    class: &str,
) -> Vec<ClassStudent> {
    // First matching record per student supplies the student number.
    let mut numbers: BTreeMap<&str, &str> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.academic_year == year && r.class == class)
    {
        numbers
            .entry(record.id.as_str())
            .or_insert(record.student_number.as_str());
    }

    let mut students: Vec<ClassStudent> = numbers
        .into_iter()
        .filter_map(|(id, number)| {
            let profile = roster.get(id)?;
            Some(ClassStudent {
                id: profile.id.clone(),
                name: profile.name.clone(),
                student_number: number.to_string(),
                label: format!("{number} - {}", profile.name),
            })
        })
        .collect();
    students.sort_by_key(|s| student_number_key(&s.student_number));
    students
}

/// Per-subject yearly means for one student, over subjects in
/// `subject_order`. Every subject gets a series, empty or not. `None` when
/// the id, once normalized, is not on the roster.
pub fn track_student(
    records: &ScoreRecords,
    roster: &Roster,
    subject_order: &[String],
    id: &str,
) -> Option<StudentTrack> {
    let profile = roster.get(&normalize_id(id))?;
    let own: Vec<_> = records
        .for_student(&profile.id)
        .filter(|r| subject_order.contains(&r.subject))
        .collect();

    let years: Vec<String> = own
        .iter()
        .map(|r| r.academic_year.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let subjects = yearly_series(own.iter().copied(), subject_order, &years, |r| {
        r.subject.as_str()
    });

    let plotted: Vec<f64> = subjects
        .iter()
        .flat_map(|s| s.points.iter().filter_map(|p| p.average))
        .collect();
    let bounds = min_max(&plotted);

    Some(StudentTrack {
        id: profile.id.clone(),
        name: profile.name.clone(),
        years,
        subjects,
        min_score: bounds.map(|(min, _)| min),
        max_score: bounds.map(|(_, max)| max),
    })
}
