//! Grade and class reference catalogs.
//!
//! Both catalogs are fatal on failure: a missing column, an empty table, a
//! repeated code or a class pointing at an unknown grade aborts the run.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{Diagnostic, LoadError, RejectReason, Staged, TableKind};
use crate::parser::{ClassRow, GradeRow};

/// Grade code → grade name, plus grade names in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct GradeCatalog {
    names: BTreeMap<String, String>,
    order: Vec<String>,
}

impl GradeCatalog {
    /// Builds the catalog from raw grade rows.
    ///
    /// # Errors
    ///
    /// Fails if no row is usable or a code repeats.
    pub fn from_rows(rows: &[GradeRow]) -> Result<Staged<Self>, LoadError> {
        let mut names = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut diagnostics = Vec::new();

        for row in rows {
            if row.grade_name.is_empty() {
                diagnostics.push(reject(TableKind::Grades, row.number, "grade_name"));
                continue;
            }
            if row.grade_code.is_empty() {
                diagnostics.push(reject(TableKind::Grades, row.number, "grade_code"));
                continue;
            }
            if names
                .insert(row.grade_code.clone(), row.grade_name.clone())
                .is_some()
            {
                return Err(LoadError::DuplicateCode {
                    table: TableKind::Grades,
                    code: row.grade_code.clone(),
                });
            }
            if !order.contains(&row.grade_name) {
                order.push(row.grade_name.clone());
            }
        }

        if names.is_empty() {
            return Err(LoadError::Empty {
                table: TableKind::Grades,
            });
        }

        Ok(Staged::new(Self { names, order }, diagnostics))
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Grade names in catalog order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassEntry {
    pub code: String,
    pub name: String,
    pub grade_code: String,
}

/// Class code → entry, with a reverse index from class name to code.
#[derive(Debug, Clone, Serialize)]
pub struct ClassCatalog {
    entries: BTreeMap<String, ClassEntry>,
    order: Vec<String>,
    #[serde(skip)]
    by_name: HashMap<String, String>,
}

impl ClassCatalog {
    /// Builds the catalog and checks every grade code against `grades`.
    ///
    /// # Errors
    ///
    /// Fails if no row is usable, a code repeats, or a grade code dangles.
    pub fn from_rows(rows: &[ClassRow], grades: &GradeCatalog) -> Result<Staged<Self>, LoadError> {
        let mut entries = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut by_name = HashMap::new();
        let mut diagnostics = Vec::new();

        for row in rows {
            let missing = [
                ("class_name", &row.class_name),
                ("class_code", &row.class_code),
                ("grade_code", &row.grade_code),
            ]
            .into_iter()
            .find(|(_, value)| value.is_empty());
            if let Some((field, _)) = missing {
                diagnostics.push(reject(TableKind::Classes, row.number, field));
                continue;
            }

            if grades.name(&row.grade_code).is_none() {
                return Err(LoadError::DanglingGradeCode {
                    class_code: row.class_code.clone(),
                    grade_code: row.grade_code.clone(),
                });
            }

            let entry = ClassEntry {
                code: row.class_code.clone(),
                name: row.class_name.clone(),
                grade_code: row.grade_code.clone(),
            };
            if entries.insert(row.class_code.clone(), entry).is_some() {
                return Err(LoadError::DuplicateCode {
                    table: TableKind::Classes,
                    code: row.class_code.clone(),
                });
            }

            // Two codes sharing a name: the first one listed wins the reverse lookup.
            by_name
                .entry(row.class_name.clone())
                .or_insert_with(|| row.class_code.clone());
            if !order.contains(&row.class_name) {
                order.push(row.class_name.clone());
            }
        }

        if entries.is_empty() {
            return Err(LoadError::Empty {
                table: TableKind::Classes,
            });
        }

        Ok(Staged::new(
            Self {
                entries,
                order,
                by_name,
            },
            diagnostics,
        ))
    }

    pub fn get(&self, code: &str) -> Option<&ClassEntry> {
        self.entries.get(code)
    }

    /// Reverse lookup by exact class name.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Class names in catalog order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both catalogs, built together so the class→grade chain is always consistent.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceCatalogs {
    pub grades: GradeCatalog,
    pub classes: ClassCatalog,
}

impl ReferenceCatalogs {
    /// # Errors
    ///
    /// Propagates any fatal catalog error.
    #[tracing::instrument(skip_all, fields(grade_rows = grade_rows.len(), class_rows = class_rows.len()))]
    pub fn resolve(
        grade_rows: &[GradeRow],
        class_rows: &[ClassRow],
    ) -> Result<Staged<Self>, LoadError> {
        let (grades, mut diagnostics) = GradeCatalog::from_rows(grade_rows)?.into_parts();
        let (classes, class_diagnostics) = ClassCatalog::from_rows(class_rows, &grades)?.into_parts();
        diagnostics.extend(class_diagnostics);

        for diag in &diagnostics {
            warn!(%diag, "Catalog row skipped");
        }
        info!(
            grades = grades.len(),
            classes = classes.len(),
            "Reference catalogs resolved"
        );

        Ok(Staged::new(Self { grades, classes }, diagnostics))
    }

    /// Follows class name → class code → grade code → grade name.
    pub fn grade_for_class(&self, class_name: &str) -> Result<&str, RejectReason> {
        let code = self
            .classes
            .code_for_name(class_name)
            .ok_or_else(|| RejectReason::UnknownClass(class_name.to_string()))?;
        let entry = self
            .classes
            .get(code)
            .ok_or_else(|| RejectReason::UnknownClassGrade(code.to_string()))?;
        self.grades
            .name(&entry.grade_code)
            .ok_or_else(|| RejectReason::UnknownGrade(entry.grade_code.clone()))
    }
}

fn reject(table: TableKind, row: usize, field: &'static str) -> Diagnostic {
    Diagnostic::new(table, row, RejectReason::MissingField(field))
}
