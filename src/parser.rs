//! CSV table reader with header-alias schemas.
//!
//! Each input table declares a [`TableSchema`] listing its required columns and
//! the header spellings accepted for each. The header row is bound once; the
//! data rows then come out as typed structs implementing [`FromRow`].

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::errors::{LoadError, TableKind};

/// A required column and the header names accepted for it.
#[derive(Debug)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

/// The declared shape of one input table.
#[derive(Debug)]
pub struct TableSchema {
    pub table: TableKind,
    pub columns: &'static [ColumnSpec],
}

pub const GRADE_SCHEMA: TableSchema = TableSchema {
    table: TableKind::Grades,
    columns: &[
        ColumnSpec {
            field: "grade_name",
            aliases: &["年級", "年級名稱", "grade", "gradeName"],
        },
        ColumnSpec {
            field: "grade_code",
            aliases: &["年級代號", "code", "gradeCode"],
        },
    ],
};

pub const CLASS_SCHEMA: TableSchema = TableSchema {
    table: TableKind::Classes,
    columns: &[
        ColumnSpec {
            field: "class_name",
            aliases: &["班級", "class", "className"],
        },
        ColumnSpec {
            field: "class_code",
            aliases: &["班級代號", "classCode"],
        },
        ColumnSpec {
            field: "grade_code",
            aliases: &["年級代號", "gradeCode"],
        },
    ],
};

pub const STUDENT_SCHEMA: TableSchema = TableSchema {
    table: TableKind::Students,
    columns: &[
        ColumnSpec {
            field: "id",
            aliases: &["id", "學號", "studentId"],
        },
        ColumnSpec {
            field: "name",
            aliases: &["姓名", "name"],
        },
        ColumnSpec {
            field: "gender",
            aliases: &["性別", "姓別", "gender"],
        },
    ],
};

pub const SCORE_SCHEMA: TableSchema = TableSchema {
    table: TableKind::Scores,
    columns: &[
        ColumnSpec {
            field: "id",
            aliases: &["id", "studentId"],
        },
        ColumnSpec {
            field: "academic_year",
            aliases: &["學年", "academicYear", "year"],
        },
        ColumnSpec {
            field: "semester",
            aliases: &["學期", "semester"],
        },
        ColumnSpec {
            field: "class_name",
            aliases: &["班級", "class", "className"],
        },
        ColumnSpec {
            field: "student_number",
            aliases: &["學號", "studentNumber"],
        },
        ColumnSpec {
            field: "subject",
            aliases: &["科目", "subject"],
        },
        ColumnSpec {
            field: "average_score",
            aliases: &["平均分", "averageScore", "score"],
        },
    ],
};

pub const SUBJECT_SCHEMA: TableSchema = TableSchema {
    table: TableKind::Subjects,
    columns: &[
        ColumnSpec {
            field: "grade_name",
            aliases: &["年級", "grade", "gradeName"],
        },
        ColumnSpec {
            field: "subject",
            aliases: &["科目", "subject"],
        },
    ],
};

impl TableSchema {
    /// Resolves each declared column to its position in `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumn`] naming the headers seen when any
    /// declared column has no matching header.
    pub fn bind(&self, headers: &[String]) -> Result<Vec<usize>, LoadError> {
        self.columns
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| column.aliases.contains(&h.as_str()))
                    .ok_or_else(|| LoadError::MissingColumn {
                        table: self.table,
                        field: column.field,
                        accepted: column.aliases.join(", "),
                        seen: headers.join(", "),
                    })
            })
            .collect()
    }
}

/// One data row after header binding. Cells are addressed by schema column.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    /// 1-based data row number.
    pub number: usize,
    cells: &'a [String],
    positions: &'a [usize],
}

impl<'a> Row<'a> {
    /// Trimmed cell for schema column `column`; empty when the row is short.
    pub fn cell(&self, column: usize) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&pos| self.cells.get(pos))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A typed row of one input table.
pub trait FromRow: Sized {
    const SCHEMA: &'static TableSchema;

    fn from_row(row: Row<'_>) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRow {
    pub number: usize,
    pub grade_name: String,
    pub grade_code: String,
}

impl FromRow for GradeRow {
    const SCHEMA: &'static TableSchema = &GRADE_SCHEMA;

    fn from_row(row: Row<'_>) -> Self {
        Self {
            number: row.number,
            grade_name: row.cell(0).to_string(),
            grade_code: row.cell(1).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRow {
    pub number: usize,
    pub class_name: String,
    pub class_code: String,
    pub grade_code: String,
}

impl FromRow for ClassRow {
    const SCHEMA: &'static TableSchema = &CLASS_SCHEMA;

    fn from_row(row: Row<'_>) -> Self {
        Self {
            number: row.number,
            class_name: row.cell(0).to_string(),
            class_code: row.cell(1).to_string(),
            grade_code: row.cell(2).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRow {
    pub number: usize,
    pub id: String,
    pub name: String,
    pub gender: String,
}

impl FromRow for StudentRow {
    const SCHEMA: &'static TableSchema = &STUDENT_SCHEMA;

    fn from_row(row: Row<'_>) -> Self {
        Self {
            number: row.number,
            id: row.cell(0).to_string(),
            name: row.cell(1).to_string(),
            gender: row.cell(2).to_string(),
        }
    }
}

/// A score row exactly as read; parsing and validation happen in the joiner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub number: usize,
    pub id: String,
    pub academic_year: String,
    pub semester: String,
    pub class_name: String,
    pub student_number: String,
    pub subject: String,
    pub average_score: String,
}

impl FromRow for ScoreRow {
    const SCHEMA: &'static TableSchema = &SCORE_SCHEMA;

    fn from_row(row: Row<'_>) -> Self {
        Self {
            number: row.number,
            id: row.cell(0).to_string(),
            academic_year: row.cell(1).to_string(),
            semester: row.cell(2).to_string(),
            class_name: row.cell(3).to_string(),
            student_number: row.cell(4).to_string(),
            subject: row.cell(5).to_string(),
            average_score: row.cell(6).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub number: usize,
    pub grade_name: String,
    pub subject: String,
}

impl FromRow for SubjectRow {
    const SCHEMA: &'static TableSchema = &SUBJECT_SCHEMA;

    fn from_row(row: Row<'_>) -> Self {
        Self {
            number: row.number,
            grade_name: row.cell(0).to_string(),
            subject: row.cell(1).to_string(),
        }
    }
}

/// Reads and binds a whole table from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read as CSV or a required column is
/// missing.
pub fn load_table<T: FromRow>(path: &Path) -> Result<Vec<T>, LoadError> {
    let table = T::SCHEMA.table;
    let origin = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Unreadable {
        table,
        origin: origin.clone(),
        source: csv::Error::from(e),
    })?;
    parse_table(file, &origin)
}

/// Reads and binds a whole table from any reader. `origin` names the source
/// in error messages.
///
/// # Errors
///
/// Returns an error if the input is not valid CSV or a required column is
/// missing.
pub fn parse_table<T: FromRow, R: Read>(reader: R, origin: &str) -> Result<Vec<T>, LoadError> {
    let table = T::SCHEMA.table;
    let unreadable = |source: csv::Error| LoadError::Unreadable {
        table,
        origin: origin.to_string(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    // Badly encoded bytes become U+FFFD; the row is still read.
    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(unreadable)?
        .iter()
        .map(|h| decode(h).trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let positions = T::SCHEMA.bind(&headers)?;

    let mut rows = Vec::new();
    for (index, result) in rdr.byte_records().enumerate() {
        let record = result.map_err(unreadable)?;
        let cells: Vec<String> = record.iter().map(|c| decode(c).trim().to_string()).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        if record.iter().any(|c| std::str::from_utf8(c).is_err()) {
            warn!(%table, origin, row = index + 1, "Row is not valid UTF-8; decoded lossily");
        }
        rows.push(T::from_row(Row {
            number: index + 1,
            cells: &cells,
            positions: &positions,
        }));
    }

    debug!(%table, origin, rows = rows.len(), "Table loaded");
    Ok(rows)
}

fn decode(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}
