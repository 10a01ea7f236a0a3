//! Normalized records shared by every stage after the join.

use serde::Serialize;

/// Current class of a student with no score records.
pub const UNASSIGNED_CLASS: &str = "unassigned";

/// One score row after its class→grade chain has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub academic_year: String,
    pub semester: i32,
    pub class: String,
    pub grade_level: String,
    pub student_number: String,
    pub subject: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Maps free-text gender to the closed set. Matching ignores case and
    /// surrounding whitespace.
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "男" | "M" | "MALE" => Gender::Male,
            "女" | "F" | "FEMALE" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    /// Class of the latest score record, or [`UNASSIGNED_CLASS`].
    pub current_class: String,
}

impl StudentProfile {
    pub fn is_assigned(&self) -> bool {
        self.current_class != UNASSIGNED_CLASS
    }
}

/// Normalizes a student id: trimmed and uppercased.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parses a student number for ordering; non-numeric values sort as 0.
pub fn student_number_key(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_aliases() {
        assert_eq!(Gender::from_alias("男"), Gender::Male);
        assert_eq!(Gender::from_alias("m"), Gender::Male);
        assert_eq!(Gender::from_alias(" Male "), Gender::Male);
        assert_eq!(Gender::from_alias("女"), Gender::Female);
        assert_eq!(Gender::from_alias("F"), Gender::Female);
        assert_eq!(Gender::from_alias("female"), Gender::Female);
        assert_eq!(Gender::from_alias(""), Gender::Unknown);
        assert_eq!(Gender::from_alias("x"), Gender::Unknown);
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("  s123a "), "S123A");
    }

    #[test]
    fn test_student_number_key() {
        assert_eq!(student_number_key("07"), 7);
        assert_eq!(student_number_key("12"), 12);
        assert_eq!(student_number_key("n/a"), 0);
    }
}
