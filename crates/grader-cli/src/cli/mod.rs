//! CLI module for the batch grader
//!
//! Argument parsing lives in `commands`, rendering of the run summary in
//! `output`.

pub mod commands;
pub mod output;

pub use commands::GradeCli;

use crate::error::CliError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every submission was graded
    Success = 0,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Rubric or contract configuration errors
    ConfigError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Map a failed run to its exit code
    pub fn from_error(err: &CliError) -> Self {
        match err {
            CliError::InvalidInput(_) | CliError::Grade(_) => ExitCode::InvalidInput,
            CliError::FileError(_) => ExitCode::FileError,
            CliError::Config(_) => ExitCode::ConfigError,
            CliError::SerializationError(_) => ExitCode::InternalError,
        }
    }
}

/// Run the CLI and return the process exit code
pub fn run_cli(cli: GradeCli) -> ExitCode {
    let format = cli.format;
    let quiet = cli.quiet;

    match commands::execute_grade(&cli) {
        Ok(report) => {
            if quiet {
                return ExitCode::Success;
            }
            match output::BatchOutput::from_report(&report).render(format) {
                Ok(()) => ExitCode::Success,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from_error(&e)
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_user_error() {
                ExitCode::from_error(&e)
            } else {
                ExitCode::InternalError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::{ConfigError, GradeError};

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::InvalidInput), 3);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&CliError::file_error("missing")),
            ExitCode::FileError
        );
        assert_eq!(
            ExitCode::from_error(&CliError::from(ConfigError::UnknownCategory("x".into()))),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from_error(&CliError::from(GradeError::InvalidPotentialPoints(-1.0))),
            ExitCode::InvalidInput
        );
    }
}
