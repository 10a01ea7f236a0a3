//! Subject listing per grade, plus the global subject display order.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::errors::{Diagnostic, RejectReason, Staged, TableKind};
use crate::parser::SubjectRow;

/// Serializes as the grade → subjects map; the global order is published
/// separately.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SubjectCatalog {
    /// Grade name → subjects in first-seen order, no duplicates.
    by_grade: BTreeMap<String, Vec<String>>,
    /// Every subject in first-seen order, no duplicates.
    #[serde(skip)]
    order: Vec<String>,
}

impl SubjectCatalog {
    pub fn from_rows(rows: &[SubjectRow]) -> Staged<Self> {
        let mut catalog = Self::default();
        let mut diagnostics = Vec::new();

        for row in rows {
            if row.grade_name.is_empty() {
                diagnostics.push(missing(row.number, "grade_name"));
                continue;
            }
            if row.subject.is_empty() {
                diagnostics.push(missing(row.number, "subject"));
                continue;
            }

            let subjects = catalog.by_grade.entry(row.grade_name.clone()).or_default();
            if !subjects.contains(&row.subject) {
                subjects.push(row.subject.clone());
            }
            if !catalog.order.contains(&row.subject) {
                catalog.order.push(row.subject.clone());
            }
        }

        info!(
            grades = catalog.by_grade.len(),
            subjects = catalog.order.len(),
            "Subject catalog built"
        );
        Staged::new(catalog, diagnostics)
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }
}

fn missing(row: usize, field: &'static str) -> Diagnostic {
    Diagnostic::new(TableKind::Subjects, row, RejectReason::MissingField(field))
}
