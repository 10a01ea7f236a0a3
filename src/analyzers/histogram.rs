//! Score distribution over ten fixed-width intervals.

use crate::analyzers::averaging::final_averages;
use crate::analyzers::filter::RecordFilter;
use crate::analyzers::types::{BinStudent, HistogramBin};
use crate::analyzers::utility::round_half_up;
use crate::joiner::ScoreRecords;
use crate::models::student_number_key;
use crate::roster::Roster;

pub const BIN_COUNT: usize = 10;

/// Inclusive bounds of bin `index`: `0-10`, `11-20`, …, `91-100`.
pub fn bin_bounds(index: usize) -> (u32, u32) {
    let max = (index as u32 + 1) * 10;
    let min = if index == 0 { 0 } else { max - 9 };
    (min, max)
}

pub fn bin_label(index: usize) -> String {
    let (min, max) = bin_bounds(index);
    format!("{min}-{max}")
}

/// Bin index for a rounded score; `None` outside `[0, 100]`.
pub fn bin_index(rounded: i64) -> Option<usize> {
    match rounded {
        0..=10 => Some(0),
        11..=100 => Some(((rounded - 1) / 10) as usize),
        _ => None,
    }
}

/// Builds the non-empty bins for the records matching `filter`.
///
/// A specific year uses that year's mean directly; all years uses the mean
/// of the yearly means. Only the bin choice uses the rounded value.
pub fn histogram(records: &ScoreRecords, roster: &Roster, filter: &RecordFilter) -> Vec<HistogramBin> {
    let mut bins: Vec<Vec<BinStudent>> = vec![Vec::new(); BIN_COUNT];

    for avg in final_averages(filter.apply(records)) {
        let Some(index) = bin_index(round_half_up(avg.final_average)) else {
            continue;
        };
        bins[index].push(BinStudent {
            id: avg.id.to_string(),
            name: roster.display_name(avg.id).to_string(),
            class: avg.latest.class.clone(),
            student_number: avg.latest.student_number.clone(),
            year: avg.latest.academic_year.clone(),
            average: avg.final_average,
        });
    }

    bins.into_iter()
        .enumerate()
        .filter(|(_, students)| !students.is_empty())
        .map(|(index, mut students)| {
            students.sort_by(|a, b| {
                a.year
                    .cmp(&b.year)
                    .then_with(|| a.class.cmp(&b.class))
                    .then_with(|| {
                        student_number_key(&a.student_number)
                            .cmp(&student_number_key(&b.student_number))
                    })
            });
            let (min, max) = bin_bounds(index);
            HistogramBin {
                label: bin_label(index),
                min,
                max,
                count: students.len(),
                students,
            }
        })
        .collect()
}

/// The students of the bin labelled `label`, in listing order. Empty when the
/// bin has no students or the label is unknown.
pub fn bin_students(
    records: &ScoreRecords,
    roster: &Roster,
    filter: &RecordFilter,
    label: &str,
) -> Vec<BinStudent> {
    histogram(records, roster, filter)
        .into_iter()
        .find(|bin| bin.label == label)
        .map(|bin| bin.students)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joiner::records_for_test;
    use crate::models::ScoreRecord;
    use crate::parser::StudentRow;

    fn record(id: &str, year: &str, subject: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            id: id.to_string(),
            academic_year: year.to_string(),
            semester: 1,
            class: format!("{}A", &year[3..]),
            grade_level: "Grade 7".to_string(),
            student_number: id[1..].to_string(),
            subject: subject.to_string(),
            average_score: score,
        }
    }

    fn roster(scores: &ScoreRecords) -> Roster {
        let rows = vec![
            StudentRow {
                number: 1,
                id: "S1".to_string(),
                name: "Amy".to_string(),
                gender: "F".to_string(),
            },
            StudentRow {
                number: 2,
                id: "S2".to_string(),
                name: "Bob".to_string(),
                gender: "M".to_string(),
            },
        ];
        Roster::normalize(&rows, scores).value
    }

    fn labels(bins: &[HistogramBin]) -> Vec<&str> {
        bins.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_bin_bounds_and_labels() {
        assert_eq!(bin_label(0), "0-10");
        assert_eq!(bin_label(1), "11-20");
        assert_eq!(bin_label(9), "91-100");
        assert_eq!(bin_bounds(4), (41, 50));
    }

    #[test]
    fn test_bin_index_edges() {
        assert_eq!(bin_index(0), Some(0));
        assert_eq!(bin_index(10), Some(0));
        assert_eq!(bin_index(11), Some(1));
        assert_eq!(bin_index(90), Some(8));
        assert_eq!(bin_index(91), Some(9));
        assert_eq!(bin_index(100), Some(9));
        assert_eq!(bin_index(101), None);
        assert_eq!(bin_index(-1), None);
    }

    #[test]
    fn test_boundary_averages() {
        for (score, expected) in [(100.0, "91-100"), (90.5, "91-100"), (90.49, "81-90")] {
            let scores = records_for_test(vec![record("S1", "2023", "Math", score)]);
            let bins = histogram(&scores, &roster(&scores), &RecordFilter::all());
            assert_eq!(labels(&bins), vec![expected], "score {score}");
            assert_eq!(bins[0].students[0].average, score);
        }
    }

    #[test]
    fn test_empty_bins_are_dropped() {
        let scores = records_for_test(vec![
            record("S1", "2023", "Math", 55.0),
            record("S2", "2023", "Math", 58.0),
        ]);
        let bins = histogram(&scores, &roster(&scores), &RecordFilter::all());

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].label, "51-60");
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn test_all_years_uses_mean_of_yearly_means() {
        // Raw mean would be (50 + 50 + 50 + 98) / 4 = 62; per-year policy gives 74.
        let scores = records_for_test(vec![
            record("S1", "2023", "Math", 50.0),
            record("S1", "2023", "Art", 50.0),
            record("S1", "2023", "Music", 50.0),
            record("S1", "2024", "Math", 98.0),
        ]);
        let bins = histogram(&scores, &roster(&scores), &RecordFilter::all());

        assert_eq!(labels(&bins), vec!["71-80"]);
        let student = &bins[0].students[0];
        assert_eq!(student.average, 74.0);
        assert_eq!(student.year, "2024");
        assert_eq!(student.class, "4A");
        assert_eq!(student.name, "Amy");
    }

    #[test]
    fn test_year_filter_uses_that_year_only() {
        let scores = records_for_test(vec![
            record("S1", "2023", "Math", 50.0),
            record("S1", "2024", "Math", 98.0),
        ]);
        let filter = RecordFilter::all().with_year("2023");
        let bins = histogram(&scores, &roster(&scores), &filter);

        assert_eq!(labels(&bins), vec!["41-50"]);
        assert_eq!(bins[0].students[0].year, "2023");
    }

    #[test]
    fn test_student_listed_once_per_bin() {
        let scores = records_for_test(vec![
            record("S1", "2023", "Math", 61.0),
            record("S1", "2023", "Art", 62.0),
            record("S1", "2023", "Music", 63.0),
        ]);
        let bins = histogram(&scores, &roster(&scores), &RecordFilter::all());
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[0].students.len(), 1);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let scores = records_for_test(vec![
            record("S1", "2023", "Math", 61.0),
            record("S2", "2024", "Math", 12.0),
        ]);
        let roster = roster(&scores);
        let filter = RecordFilter::all().with_subject("Math");
        assert_eq!(
            histogram(&scores, &roster, &filter),
            histogram(&scores, &roster, &filter)
        );
    }

    #[test]
    fn test_bin_students_listing() {
        let scores = records_for_test(vec![
            record("S2", "2023", "Math", 65.0),
            record("S1", "2023", "Math", 66.0),
            record("S9", "2023", "Math", 64.0),
        ]);
        let students = bin_students(&scores, &roster(&scores), &RecordFilter::all(), "61-70");

        let ids: Vec<_> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2", "S9"]);
        assert_eq!(students[2].name, "unknown");
        assert!(bin_students(&scores, &roster(&scores), &RecordFilter::all(), "0-10").is_empty());
    }

    #[test]
    fn test_empty_records_give_no_bins() {
        let scores = records_for_test(Vec::new());
        assert!(histogram(&scores, &Roster::default(), &RecordFilter::all()).is_empty());
    }
}
