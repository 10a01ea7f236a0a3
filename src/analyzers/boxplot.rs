use crate::analyzers::averaging::final_averages;
use crate::analyzers::filter::RecordFilter;
use crate::analyzers::types::BoxStat;
use crate::analyzers::utility::{mean, quantile, sort_ascending};
use crate::joiner::ScoreRecords;

/// Box-plot statistics of the final averages of students in `grade`.
///
/// The filter's own grade, if any, is ignored in favour of `grade`. An empty
/// grade yields `count == 0` and every statistic `None`.
pub fn box_stats(records: &ScoreRecords, grade: &str, filter: &RecordFilter) -> BoxStat {
    let view = RecordFilter {
        grade: Some(grade.to_string()),
        ..filter.clone()
    };
    let mut averages: Vec<f64> = final_averages(view.apply(records))
        .into_iter()
        .map(|a| a.final_average)
        .collect();
    sort_ascending(&mut averages);

    BoxStat {
        grade: grade.to_string(),
        min: averages.first().copied(),
        q1: quantile(&averages, 0.25),
        median: quantile(&averages, 0.5),
        q3: quantile(&averages, 0.75),
        max: averages.last().copied(),
        mean: mean(&averages),
        count: averages.len(),
    }
}

/// One [`BoxStat`] per grade in `grades` order, skipping grades without students.
pub fn box_stats_by_grade(
    records: &ScoreRecords,
    grades: &[String],
    filter: &RecordFilter,
) -> Vec<BoxStat> {
    grades
        .iter()
        .map(|grade| box_stats(records, grade, filter))
        .filter(|stat| stat.count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joiner::records_for_test;
    use crate::models::ScoreRecord;

    fn record(id: &str, grade: &str, year: &str, subject: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            id: id.to_string(),
            academic_year: year.to_string(),
            semester: 1,
            class: "A".to_string(),
            grade_level: grade.to_string(),
            student_number: "1".to_string(),
            subject: subject.to_string(),
            average_score: score,
        }
    }

    #[test]
    fn test_quartiles_use_linear_interpolation() {
        let scores = records_for_test(vec![
            record("S4", "Grade 7", "2023", "Math", 90.0),
            record("S1", "Grade 7", "2023", "Math", 60.0),
            record("S3", "Grade 7", "2023", "Math", 80.0),
            record("S2", "Grade 7", "2023", "Math", 70.0),
        ]);
        let stat = box_stats(&scores, "Grade 7", &RecordFilter::all());

        assert_eq!(stat.count, 4);
        assert_eq!(stat.min, Some(60.0));
        assert_eq!(stat.q1, Some(67.5));
        assert_eq!(stat.median, Some(75.0));
        assert_eq!(stat.q3, Some(82.5));
        assert_eq!(stat.max, Some(90.0));
        assert_eq!(stat.mean, Some(75.0));
    }

    #[test]
    fn test_single_student_collapses_to_one_value() {
        let scores = records_for_test(vec![record("S1", "Grade 7", "2023", "Math", 64.0)]);
        let stat = box_stats(&scores, "Grade 7", &RecordFilter::all());
        for value in [stat.min, stat.q1, stat.median, stat.q3, stat.max, stat.mean] {
            assert_eq!(value, Some(64.0));
        }
    }

    #[test]
    fn test_empty_grade_is_null_not_error() {
        let scores = records_for_test(vec![record("S1", "Grade 7", "2023", "Math", 64.0)]);
        let stat = box_stats(&scores, "Grade 9", &RecordFilter::all());

        assert_eq!(stat.count, 0);
        assert!(stat.min.is_none());
        assert!(stat.median.is_none());
        assert!(stat.mean.is_none());
        let json = serde_json::to_value(&stat).unwrap();
        assert!(json["q1"].is_null());
    }

    #[test]
    fn test_students_are_averaged_before_quartiles() {
        // S1 has two subjects (60, 80 → 70); one value per student.
        let scores = records_for_test(vec![
            record("S1", "Grade 7", "2023", "Math", 60.0),
            record("S1", "Grade 7", "2023", "Art", 80.0),
            record("S2", "Grade 7", "2023", "Math", 90.0),
        ]);
        let stat = box_stats(&scores, "Grade 7", &RecordFilter::all());
        assert_eq!(stat.count, 2);
        assert_eq!(stat.min, Some(70.0));
        assert_eq!(stat.median, Some(80.0));
    }

    #[test]
    fn test_subject_and_year_filters_apply() {
        let scores = records_for_test(vec![
            record("S1", "Grade 7", "2023", "Math", 60.0),
            record("S1", "Grade 7", "2023", "Art", 80.0),
            record("S1", "Grade 7", "2024", "Math", 100.0),
        ]);
        let math = box_stats(&scores, "Grade 7", &RecordFilter::all().with_subject("Math"));
        assert_eq!(math.mean, Some(80.0));

        let year = box_stats(&scores, "Grade 7", &RecordFilter::all().with_year("2023"));
        assert_eq!(year.mean, Some(70.0));
    }

    #[test]
    fn test_by_grade_follows_order_and_skips_empty() {
        let scores = records_for_test(vec![
            record("S1", "Grade 8", "2023", "Math", 60.0),
            record("S2", "Grade 7", "2023", "Math", 80.0),
        ]);
        let grades = vec![
            "Grade 7".to_string(),
            "Grade 8".to_string(),
            "Grade 9".to_string(),
        ];
        let stats = box_stats_by_grade(&scores, &grades, &RecordFilter::all());

        let names: Vec<_> = stats.iter().map(|s| s.grade.as_str()).collect();
        assert_eq!(names, vec!["Grade 7", "Grade 8"]);
    }
}
