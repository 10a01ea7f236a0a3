//! Aggregate shapes returned to the presentation layer.
//!
//! All of them serialize to plain JSON; missing statistics are `null`.

use serde::Serialize;

/// A student contributing to a histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinStudent {
    pub id: String,
    pub name: String,
    pub class: String,
    pub student_number: String,
    /// Year the class and student number were taken from.
    pub year: String,
    /// Unrounded final average.
    pub average: f64,
}

/// One non-empty score interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub label: String,
    pub min: u32,
    pub max: u32,
    pub count: usize,
    pub students: Vec<BinStudent>,
}

/// Box-plot summary of the final averages in one grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStat {
    pub grade: String,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub count: usize,
}

/// Statistics over per-student means within one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub average: f64,
    /// Number of students, not rows.
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

/// Per-subject comparison row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStat {
    pub subject: String,
    pub average: f64,
    pub count: usize,
    /// Percentage of students whose mean reaches the pass mark.
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: String,
    /// `None` when the year has no matching rows.
    pub average: Option<f64>,
}

/// One line of a trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub label: String,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn has_data(&self) -> bool {
        self.points.iter().any(|p| p.average.is_some())
    }
}

/// A student listed under a class for the tracking view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudent {
    pub id: String,
    pub name: String,
    pub student_number: String,
    pub label: String,
}

/// Per-subject yearly means for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTrack {
    pub id: String,
    pub name: String,
    pub years: Vec<String>,
    pub subjects: Vec<TrendSeries>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}
