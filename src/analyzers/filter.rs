use serde::{Deserialize, Serialize};

use crate::models::ScoreRecord;

/// Keyword that selects every value of a filter dimension.
pub const ALL: &str = "all";

/// Caller-supplied view over the score records. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub subject: Option<String>,
    pub year: Option<String>,
    pub grade: Option<String>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    pub fn matches(&self, record: &ScoreRecord) -> bool {
        let accepts = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().is_none_or(|w| w == actual)
        };
        accepts(&self.subject, &record.subject)
            && accepts(&self.year, &record.academic_year)
            && accepts(&self.grade, &record.grade_level)
    }

    pub fn apply<'a, I>(&'a self, records: I) -> impl Iterator<Item = &'a ScoreRecord> + 'a
    where
        I: IntoIterator<Item = &'a ScoreRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().filter(move |r| self.matches(r))
    }
}

/// Parses a filter argument: [`ALL`] or an empty string selects everything.
pub fn selection(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == ALL {
        None
    } else {
        Some(value.to_string())
    }
}
