//! CLI entry point for the school score report tool.
//!
//! Provides subcommands for building the normalized report payload, printing
//! each aggregate view as JSON, exporting a histogram bin's students, and
//! listing rejected rows.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use school_score_report::analyzers::{
    boxplot::box_stats_by_grade,
    category::{gender_stats, grade_level_stats, subject_comparison},
    filter::{RecordFilter, selection},
    histogram::{bin_students, histogram},
    tracking::{classes_in_year, students_in_class, track_student},
    trend::{grade_trends, subject_trends},
};
use school_score_report::{
    config::{InputFiles, InputOverrides},
    output::{print_json, write_bin_students_csv, write_json},
    pipeline::{ReportData, run_files},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "school_score_report")]
#[command(about = "Normalize school score tables and compute report statistics", long_about = None)]
struct Cli {
    /// Directory holding the input CSVs (falls back to SCORE_REPORT_DATA_DIR, then ".")
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON file overriding individual input paths
    #[arg(short, long, global = true)]
    inputs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the normalized report payload as JSON
    Build {
        /// JSON file to write the payload to
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
    },
    /// Score distribution over ten intervals
    Histogram {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Box-plot statistics per grade
    Boxplot {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Statistics by gender or grade level
    Categories {
        #[arg(long, value_enum, default_value_t = CategoryKind::Gender)]
        by: CategoryKind,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Year-over-year trend lines by subject or grade level
    Trends {
        #[arg(long, value_enum, default_value_t = TrendKind::Subject)]
        by: TrendKind,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Per-subject average and pass rate
    Subjects {
        /// Academic year, or "all"
        #[arg(short, long, default_value = "all")]
        year: String,

        /// Grade levels to include (repeatable); all grades when omitted
        #[arg(short, long = "grade")]
        grades: Vec<String>,
    },
    /// Classes with records in a year, or the students of one class
    Classes {
        #[arg(short, long)]
        year: String,

        /// List the students of this class instead
        #[arg(short, long)]
        class: Option<String>,
    },
    /// One student's per-subject yearly means
    Track {
        /// Student id
        #[arg(value_name = "STUDENT_ID")]
        student: String,
    },
    /// Export the students of one histogram bin as CSV
    BinStudents {
        /// Bin label, e.g. "61-70"
        #[arg(short, long)]
        bin: String,

        /// CSV file to write
        #[arg(short, long, default_value = "bin_students.csv")]
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print every rejected row
    Diagnostics,
}

/// Subject, year and grade selections; "all" selects everything.
#[derive(Args)]
struct FilterArgs {
    #[arg(short, long, default_value = "all")]
    subject: String,

    #[arg(short, long, default_value = "all")]
    year: String,

    #[arg(short, long, default_value = "all")]
    grade: String,
}

impl FilterArgs {
    fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            subject: selection(&self.subject),
            year: selection(&self.year),
            grade: selection(&self.grade),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryKind {
    Gender,
    Grade,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrendKind {
    Subject,
    Grade,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/school_score_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("school_score_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let files = input_files(cli.data_dir, cli.inputs.as_deref())?;
    let data = run_files(&files).context("report pipeline aborted")?;

    match cli.command {
        Commands::Build { output } => {
            for (table, count) in data.diagnostic_counts() {
                if count > 0 {
                    warn!(%table, rejected = count, "Rows rejected");
                }
            }
            write_json(&output, &data.payload())?;
        }
        Commands::Histogram { filter } => {
            print_json(&histogram(&data.records, &data.roster, &filter.to_filter()))?;
        }
        Commands::Boxplot { filter } => {
            print_json(&box_stats_by_grade(
                &data.records,
                data.grade_order(),
                &filter.to_filter(),
            ))?;
        }
        Commands::Categories { by, filter } => {
            let filter = filter.to_filter();
            let stats = match by {
                CategoryKind::Gender => gender_stats(&data.records, &data.roster, &filter),
                CategoryKind::Grade => grade_level_stats(&data.records, data.grade_order(), &filter),
            };
            print_json(&stats)?;
        }
        Commands::Trends { by, filter } => {
            let filter = filter.to_filter();
            let series = match by {
                TrendKind::Subject => {
                    subject_trends(&data.records, data.subject_order(), &data.years, &filter)
                }
                TrendKind::Grade => {
                    grade_trends(&data.records, data.grade_order(), &data.years, &filter)
                }
            };
            print_json(&series)?;
        }
        Commands::Subjects { year, grades } => {
            let filter = RecordFilter {
                year: selection(&year),
                ..RecordFilter::all()
            };
            print_json(&subject_comparison(
                &data.records,
                data.subject_order(),
                &grades,
                &filter,
            ))?;
        }
        Commands::Classes { year, class } => match class {
            Some(class) => print_json(&students_in_class(&data.records, &data.roster, &year, &class))?,
            None => print_json(&classes_in_year(&data.records, data.class_order(), &year))?,
        },
        Commands::Track { student } => {
            let Some(track) = track_student(&data.records, &data.roster, data.subject_order(), &student)
            else {
                bail!("student {student} is not on the roster");
            };
            print_json(&track)?;
        }
        Commands::BinStudents {
            bin,
            output,
            filter,
        } => export_bin(&data, &bin, &output, &filter.to_filter())?,
        Commands::Diagnostics => print_json(&data.diagnostics)?,
    }

    Ok(())
}

/// Resolves the input table locations from flags, environment, and overrides.
fn input_files(data_dir: Option<PathBuf>, inputs: Option<&Path>) -> Result<InputFiles> {
    let dir = data_dir
        .or_else(|| std::env::var_os("SCORE_REPORT_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let files = match inputs {
        Some(path) => InputFiles::with_overrides(&dir, InputOverrides::load(path)?),
        None => InputFiles::in_dir(&dir),
    };
    info!(data_dir = %dir.display(), "Input files resolved");
    Ok(files)
}

#[tracing::instrument(skip(data, filter))]
fn export_bin(data: &ReportData, bin: &str, output: &Path, filter: &RecordFilter) -> Result<()> {
    let students = bin_students(&data.records, &data.roster, filter, bin);
    if students.is_empty() {
        warn!("Bin has no students; writing header only");
    }
    write_bin_students_csv(output, &students)?;
    info!(students = students.len(), "Bin students exported");
    Ok(())
}
