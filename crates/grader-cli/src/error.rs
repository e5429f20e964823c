//! Error types for the batch grading CLI

use grader_core::{ConfigError, GradeError};
use thiserror::Error;

/// Main error type for batch grading runs
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Rubric or contract could not be built
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Grading rejected its inputs
    #[error("Grading error: {0}")]
    Grade(#[from] GradeError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CliError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CliError::InvalidInput(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        CliError::FileError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CliError::SerializationError(_))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::SerializationError(format!("YAML error: {}", err))
    }
}
