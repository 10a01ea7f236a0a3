//! Year-over-year trend lines.
//!
//! Unlike the student-centric aggregates, a trend point is the flat mean of all
//! matching rows for that year: it describes how a subject or grade did, not
//! how each student did.

use std::collections::BTreeMap;

use crate::analyzers::filter::RecordFilter;
use crate::analyzers::types::{TrendPoint, TrendSeries};
use crate::joiner::ScoreRecords;
use crate::models::ScoreRecord;

/// One series per label in `labels`, one point per year in `years`, keeping
/// series without any data.
pub fn yearly_series<'a, I, F>(
    records: I,
    labels: &[String],
    years: &[String],
    key: F,
) -> Vec<TrendSeries>
where
    I: IntoIterator<Item = &'a ScoreRecord>,
    F: Fn(&'a ScoreRecord) -> &'a str,
{
    let mut totals: BTreeMap<(&'a str, &'a str), (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals
            .entry((key(record), record.academic_year.as_str()))
            .or_insert((0.0, 0));
        entry.0 += record.average_score;
        entry.1 += 1;
    }

    labels
        .iter()
        .map(|label| TrendSeries {
            label: label.clone(),
            points: years
                .iter()
                .map(|year| TrendPoint {
                    year: year.clone(),
                    average: totals
                        .get(&(label.as_str(), year.as_str()))
                        .map(|(sum, count)| sum / *count as f64),
                })
                .collect(),
        })
        .collect()
}

/// [`yearly_series`] without the series that have no data at all.
pub fn trend_series<'a, I, F>(
    records: I,
    labels: &[String],
    years: &[String],
    key: F,
) -> Vec<TrendSeries>
where
    I: IntoIterator<Item = &'a ScoreRecord>,
    F: Fn(&'a ScoreRecord) -> &'a str,
{
    let mut series = yearly_series(records, labels, years, key);
    series.retain(TrendSeries::has_data);
    series
}

/// Per-subject trend lines in `subject_order`.
pub fn subject_trends(
    records: &ScoreRecords,
    subject_order: &[String],
    years: &[String],
    filter: &RecordFilter,
) -> Vec<TrendSeries> {
    trend_series(filter.apply(records), subject_order, years, |r| r.subject.as_str())
}

/// Per-grade trend lines in `grade_order`.
pub fn grade_trends(
    records: &ScoreRecords,
    grade_order: &[String],
    years: &[String],
    filter: &RecordFilter,
) -> Vec<TrendSeries> {
    trend_series(filter.apply(records), grade_order, years, |r| {
        r.grade_level.as_str()
    })
}
