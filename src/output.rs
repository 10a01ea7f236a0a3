//! Output formatting and persistence for report data and aggregates.
//!
//! Supports JSON on stdout, JSON files, and the bin student CSV export.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::BinStudent;
use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Prints a value as pretty-printed JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    write_json_to(std::io::stdout().lock(), value)
}

/// Writes a value as pretty-printed JSON followed by a newline.
pub fn write_json_to<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes a value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

#[derive(Serialize)]
struct BinStudentRow<'a> {
    year: &'a str,
    class: &'a str,
    student_number: &'a str,
    name: &'a str,
    average: String,
}

impl<'a> From<&'a BinStudent> for BinStudentRow<'a> {
    fn from(student: &'a BinStudent) -> Self {
        Self {
            year: &student.year,
            class: &student.class,
            student_number: &student.student_number,
            name: &student.name,
            average: format!("{:.1}", student.average),
        }
    }
}

/// Writes the students of one histogram bin as CSV, one row per student in
/// listing order, averages to one decimal.
///
/// The header row is written even when there are no students.
pub fn write_bin_students_csv(path: &Path, students: &[BinStudent]) -> Result<()> {
    create_parent(path)?;
    debug!(path = %path.display(), students = students.len(), "Writing bin students CSV");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(["year", "class", "student_number", "name", "average"])?;
    for student in students {
        writer.serialize(BinStudentRow::from(student))?;
    }
    writer.flush()?;

    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
        }
        _ => Ok(()),
    }
}
