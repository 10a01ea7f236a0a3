//! Cohort comparisons by a categorical key.
//!
//! Every statistic here is taken over per-student means inside the category,
//! never over raw rows, so a student with many subject rows still counts once.

use std::collections::BTreeMap;

use crate::analyzers::filter::RecordFilter;
use crate::analyzers::types::{CategoryStat, SubjectStat};
use crate::analyzers::utility::{mean, min_max};
use crate::joiner::ScoreRecords;
use crate::models::{Gender, ScoreRecord};
use crate::roster::Roster;

/// A student mean at or above this counts as a pass.
pub const PASS_MARK: f64 = 60.0;

/// Per-student means grouped by `key`. Records for which `key` returns `None`
/// are left out.
pub fn student_means_by<'a, K, I, F>(records: I, key: F) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    I: IntoIterator<Item = &'a ScoreRecord>,
    F: Fn(&ScoreRecord) -> Option<K>,
{
    let mut totals: BTreeMap<K, BTreeMap<&'a str, (f64, usize)>> = BTreeMap::new();
    for record in records {
        let Some(category) = key(record) else {
            continue;
        };
        let entry = totals
            .entry(category)
            .or_default()
            .entry(record.id.as_str())
            .or_insert((0.0, 0));
        entry.0 += record.average_score;
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(category, students)| {
            let means = students
                .into_values()
                .map(|(sum, count)| sum / count as f64)
                .collect();
            (category, means)
        })
        .collect()
}

/// Groups `records` by `key` and summarizes each non-empty category.
pub fn aggregate_by<'a, K, I, F>(records: I, key: F) -> BTreeMap<K, CategoryStat>
where
    K: Ord + ToString,
    I: IntoIterator<Item = &'a ScoreRecord>,
    F: Fn(&ScoreRecord) -> Option<K>,
{
    student_means_by(records, key)
        .into_iter()
        .filter_map(|(category, means)| {
            let stat = summarize(category.to_string(), &means)?;
            Some((category, stat))
        })
        .collect()
}

fn summarize(category: String, means: &[f64]) -> Option<CategoryStat> {
    let average = mean(means)?;
    let (min, max) = min_max(means)?;
    Some(CategoryStat {
        category,
        average,
        count: means.len(),
        min,
        max,
    })
}

/// Male and Female statistics, in that order. Students whose gender is
/// unknown, or who are not on the roster, are left out.
pub fn gender_stats(records: &ScoreRecords, roster: &Roster, filter: &RecordFilter) -> Vec<CategoryStat> {
    let mut stats = aggregate_by(filter.apply(records), |r| match roster.gender(&r.id) {
        Gender::Unknown => None,
        gender => Some(GenderKey(gender)),
    });
    [Gender::Male, Gender::Female]
        .into_iter()
        .filter_map(|g| stats.remove(&GenderKey(g)))
        .collect()
}

/// Grade-level statistics in `grade_order`, skipping grades without students.
pub fn grade_level_stats(
    records: &ScoreRecords,
    grade_order: &[String],
    filter: &RecordFilter,
) -> Vec<CategoryStat> {
    let mut stats = aggregate_by(filter.apply(records), |r| Some(r.grade_level.clone()));
    grade_order
        .iter()
        .filter_map(|grade| stats.remove(grade))
        .collect()
}

/// Per-subject average and pass rate over students in `grades` (all grades
/// when empty), in `subject_order`, skipping subjects without data.
pub fn subject_comparison(
    records: &ScoreRecords,
    subject_order: &[String],
    grades: &[String],
    filter: &RecordFilter,
) -> Vec<SubjectStat> {
    let in_view = filter
        .apply(records)
        .filter(|r| grades.is_empty() || grades.contains(&r.grade_level));
    let mut means = student_means_by(in_view, |r| Some(r.subject.clone()));

    subject_order
        .iter()
        .filter_map(|subject| {
            let means = means.remove(subject)?;
            let average = mean(&means)?;
            let passed = means.iter().filter(|&&m| m >= PASS_MARK).count();
            Some(SubjectStat {
                subject: subject.clone(),
                average,
                count: means.len(),
                pass_rate: passed as f64 / means.len() as f64 * 100.0,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct GenderKey(Gender);

impl std::fmt::Display for GenderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.label())
    }
}
