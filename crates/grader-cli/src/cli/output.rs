//! Output formatting for the batch grader CLI
//!
//! Renders the run summary as JSON, YAML or a human-readable table with
//! result-based coloring.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use super::commands::BatchReport;
use crate::error::CliError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Run summary for rendering
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// Number of graded submissions
    pub graded: usize,
    /// Number of submissions that earned full marks
    pub successes: usize,
    /// Sum of all awarded points
    pub total_score: f64,
    /// Point ceiling per submission
    pub potential_points: f64,
    /// Folder the grade documents were written to
    pub output_dir: String,
    /// Per-submission rows
    pub results: Vec<FileOutput>,
    /// Summary message
    pub summary: String,
}

/// Individual submission row
#[derive(Debug, Clone, Serialize)]
pub struct FileOutput {
    pub file: String,
    pub output: String,
    pub score: f64,
    pub message_type: String,
    pub message: String,
}

impl BatchOutput {
    /// Create output from a batch report
    pub fn from_report(report: &BatchReport) -> Self {
        let results: Vec<FileOutput> = report
            .graded
            .iter()
            .map(|g| FileOutput {
                file: g
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                output: g.destination.display().to_string(),
                score: g.grade.score(),
                message_type: g.grade.result_kind().to_string(),
                message: g.grade.message().to_string(),
            })
            .collect();

        let output_dir = report.output_dir.display().to_string();
        Self {
            graded: results.len(),
            successes: report.graded.iter().filter(|g| g.grade.is_success()).count(),
            total_score: results.iter().map(|r| r.score).sum(),
            potential_points: report.potential_points,
            summary: format!(
                "done! Graded {} assignments. Output files are in {}",
                results.len(),
                output_dir
            ),
            output_dir,
            results,
        }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => self.render_json(),
            OutputFormat::Yaml => self.render_yaml(),
            OutputFormat::Table => self.render_table(),
        }
    }

    fn render_json(&self) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self)?;
        println!("{}", json);
        Ok(())
    }

    fn render_yaml(&self) -> Result<(), CliError> {
        let yaml = serde_yaml::to_string(self)?;
        println!("{}", yaml);
        Ok(())
    }

    fn render_table(&self) -> Result<(), CliError> {
        let mut stdout = io::stdout();

        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Grading Results".cyan().bold()).ok();
        writeln!(stdout, "{}", "=".repeat(60)).ok();

        for row in &self.results {
            let score = format!("{:>6.2}/{:<6.2}", row.score, self.potential_points);
            let score_colored = if row.message_type == "Success" {
                score.green()
            } else {
                score.red()
            };
            writeln!(stdout, "{} {}", score_colored, row.file.bold()).ok();
            if row.message_type != "Success" {
                writeln!(
                    stdout,
                    "    {} {}",
                    format!("[{}]", row.message_type).yellow(),
                    row.message
                )
                .ok();
            }
        }

        writeln!(stdout, "{}", "-".repeat(60)).ok();
        writeln!(
            stdout,
            "{} {}/{} full marks",
            "Statistics:".cyan().bold(),
            self.successes,
            self.graded
        )
        .ok();
        writeln!(stdout, "{}", self.summary).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::GradedFile;
    use grader_core::{ErrorCategory, Grade, ResultKind};
    use std::path::PathBuf;

    #[test]
    fn test_batch_output_summary() {
        let report = BatchReport {
            output_dir: PathBuf::from("homework/out"),
            potential_points: 100.0,
            graded: vec![
                GradedFile {
                    source: PathBuf::from("homework/a.json"),
                    destination: PathBuf::from("homework/out/a.json"),
                    grade: Grade::new(100.0, "Great job!", ResultKind::Success, 100.0).unwrap(),
                },
                GradedFile {
                    source: PathBuf::from("homework/b.json"),
                    destination: PathBuf::from("homework/out/b.json"),
                    grade: Grade::new(
                        80.0,
                        "statusCode must be 200. received: 500",
                        ResultKind::Failure(ErrorCategory::ResponseFailed),
                        100.0,
                    )
                    .unwrap(),
                },
            ],
        };

        let output = BatchOutput::from_report(&report);
        assert_eq!(output.graded, 2);
        assert_eq!(output.successes, 1);
        assert_eq!(output.total_score, 180.0);
        assert_eq!(output.results[1].file, "b.json");
        assert_eq!(output.results[1].message_type, "ResponseFailedError");
        assert!(output.summary.starts_with("done! Graded 2 assignments."));
    }
}
