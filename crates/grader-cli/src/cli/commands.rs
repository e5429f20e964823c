//! CLI command definitions for the batch grader
//!
//! Mirrors the classic `grade_assignment` invocation: a folder of
//! submissions, an optional output subfolder name and an optional point
//! ceiling, all positional.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use grader_core::result::check_potential_points;
use grader_core::{Grade, Grader, Rubric, SchemaContract, Submission, DEFAULT_POTENTIAL_POINTS};

use super::output::OutputFormat;
use crate::error::CliError;

/// Grade a set of homework assignments
#[derive(Parser, Debug)]
#[command(name = "grade-assignments")]
#[command(about = "Grade a set of homework assignments", long_about = None)]
#[command(version)]
pub struct GradeCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The path to the homework files to grade
    pub filepath: PathBuf,

    /// The name of the subfolder where graded assignments will be saved
    #[arg(default_value = "out")]
    pub output_folder: String,

    /// The aggregate point potential for the assignment
    #[arg(default_value_t = DEFAULT_POTENTIAL_POINTS, allow_negative_numbers = true)]
    pub potential_points: f64,

    /// Rubric file (JSON, YAML or TOML) mapping categories to penalty fractions
    #[arg(long, env = "AG_RUBRIC_FILE", conflicts_with = "rubric_from_env")]
    pub rubric: Option<PathBuf>,

    /// Read penalty fractions from AG_*_PENALTY_PCT environment variables
    #[arg(long)]
    pub rubric_from_env: bool,

    /// Alternative schema contract file (JSON or YAML)
    #[arg(long)]
    pub contract: Option<PathBuf>,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// One graded submission
#[derive(Debug, Clone)]
pub struct GradedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub grade: Grade,
}

/// Everything a batch run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub potential_points: f64,
    pub graded: Vec<GradedFile>,
}

/// Execute a batch grading run
pub fn execute_grade(cli: &GradeCli) -> Result<BatchReport, CliError> {
    check_potential_points(cli.potential_points)?;

    let rubric = load_rubric(cli)?;
    let contract = match &cli.contract {
        Some(path) => SchemaContract::from_file(path)?,
        None => SchemaContract::builtin()?,
    };
    let grader = Grader::new(rubric, contract);

    if !cli.filepath.is_dir() {
        return Err(CliError::invalid_input(format!(
            "'{}' is not a directory",
            cli.filepath.display()
        )));
    }

    let output_dir = cli.filepath.join(&cli.output_folder);
    std::fs::create_dir_all(&output_dir).map_err(|e| {
        CliError::file_error(format!(
            "Failed to create output folder '{}': {}",
            output_dir.display(),
            e
        ))
    })?;

    let assignments = collect_assignments(&cli.filepath)?;
    info!(count = assignments.len(), folder = %cli.filepath.display(), "grading assignments");

    let mut graded = Vec::with_capacity(assignments.len());
    for source in assignments {
        let grade = grade_file(&grader, &source, cli.potential_points)?;
        let destination = write_grade(&output_dir, &source, &grade)?;
        graded.push(GradedFile {
            source,
            destination,
            grade,
        });
    }

    Ok(BatchReport {
        output_dir,
        potential_points: cli.potential_points,
        graded,
    })
}

fn load_rubric(cli: &GradeCli) -> Result<Rubric, CliError> {
    let rubric = if let Some(path) = &cli.rubric {
        Rubric::from_file(path)?
    } else if cli.rubric_from_env {
        Rubric::from_env()?
    } else {
        Rubric::default()
    };

    if !rubric.is_severity_ordered() {
        warn!("rubric penalties are not ordered by category severity");
    }
    Ok(rubric)
}

/// List the `*.json` files directly inside a folder, sorted by name
fn collect_assignments(folder: &Path) -> Result<Vec<PathBuf>, CliError> {
    let entries = std::fs::read_dir(folder).map_err(|e| {
        CliError::file_error(format!("Failed to read folder '{}': {}", folder.display(), e))
    })?;

    let mut assignments = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| CliError::file_error(e.to_string()))?
            .path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json"));
        if path.is_file() && is_json {
            assignments.push(path);
        }
    }

    assignments.sort();
    Ok(assignments)
}

fn grade_file(grader: &Grader, source: &Path, potential_points: f64) -> Result<Grade, CliError> {
    let content = std::fs::read(source).map_err(|e| {
        CliError::file_error(format!(
            "Failed to read assignment file '{}': {}",
            source.display(),
            e
        ))
    })?;

    let submission = Submission::from_bytes(&content);
    if !matches!(submission, Submission::Parsed(_)) {
        warn!(file = %source.display(), "invalid JSON in assignment file");
    }

    let grade = grader.grade(&submission, potential_points)?;
    debug!(file = %source.display(), score = grade.score(), "assignment graded");
    Ok(grade)
}

fn write_grade(output_dir: &Path, source: &Path, grade: &Grade) -> Result<PathBuf, CliError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| CliError::invalid_input(format!("'{}' has no file name", source.display())))?;
    let destination = output_dir.join(file_name);

    let document = serde_json::to_string_pretty(grade)?;
    std::fs::write(&destination, document).map_err(|e| {
        CliError::file_error(format!(
            "Failed to write grade file '{}': {}",
            destination.display(),
            e
        ))
    })?;

    Ok(destination)
}
