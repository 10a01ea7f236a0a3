//! Two-stage student averaging shared by the histogram and box plots.
//!
//! Stage one takes each student's mean per academic year. Stage two takes the
//! mean of those yearly means, so every year weighs the same however many
//! rows it has. With a single-year view stage two is the yearly mean itself.

use std::collections::BTreeMap;

use crate::analyzers::utility::mean;
use crate::models::ScoreRecord;

/// One student's final average under the active view.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAverage<'a> {
    pub id: &'a str,
    pub final_average: f64,
    /// First record of the student's latest year in view.
    pub latest: &'a ScoreRecord,
    pub years: usize,
}

#[derive(Debug)]
struct YearTotal<'a> {
    sum: f64,
    count: usize,
    first: &'a ScoreRecord,
}

/// Final averages per student, ordered by student id.
pub fn final_averages<'a, I>(records: I) -> Vec<StudentAverage<'a>>
where
    I: IntoIterator<Item = &'a ScoreRecord>,
{
    let mut by_student: BTreeMap<&'a str, BTreeMap<&'a str, YearTotal<'a>>> = BTreeMap::new();

    for record in records {
        let total = by_student
            .entry(record.id.as_str())
            .or_default()
            .entry(record.academic_year.as_str())
            .or_insert(YearTotal {
                sum: 0.0,
                count: 0,
                first: record,
            });
        total.sum += record.average_score;
        total.count += 1;
    }

    by_student
        .into_iter()
        .filter_map(|(id, years)| {
            let yearly: Vec<f64> = years.values().map(|t| t.sum / t.count as f64).collect();
            let final_average = mean(&yearly)?;
            let (_, latest) = years.last_key_value()?;
            Some(StudentAverage {
                id,
                final_average,
                latest: latest.first,
                years: years.len(),
            })
        })
        .collect()
}
