//! Error types for the grading core
//!
//! Two families live here. `ConfigError` is raised while building a rubric or
//! loading a schema contract and is fatal at setup time. `GradeError` guards
//! the invariants of the result model. Neither is a scored outcome: scored
//! outcomes are `CheckFailure`s (see [`crate::taxonomy`]).

use thiserror::Error;

use crate::taxonomy::ErrorCategory;

/// Errors raised while building grading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Penalty fraction outside the closed interval [0, 1] (or not finite)
    #[error("Invalid penalty for {category}: {value} must be between 0.00 and 1.00")]
    PenaltyOutOfRange { category: ErrorCategory, value: f64 },

    /// Penalty fraction that could not be read as a number
    #[error("Invalid penalty for {category}: '{raw}' is not a number")]
    PenaltyNotNumeric { category: ErrorCategory, raw: String },

    /// Rubric key that names no known category
    #[error("Unknown rubric category: {0}")]
    UnknownCategory(String),

    /// Environment variable present but not valid UTF-8
    #[error("Environment variable {0} contains invalid UTF-8")]
    InvalidEnvEncoding(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// File extension that maps to no supported format
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Configuration document parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Schema contract that cannot drive a validation pass
    #[error("Invalid schema contract: {0}")]
    InvalidContract(String),
}

impl ConfigError {
    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        ConfigError::FileError(msg.into())
    }

    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        ConfigError::ParseError(msg.into())
    }

    /// Create an invalid contract error
    pub fn invalid_contract(msg: impl Into<String>) -> Self {
        ConfigError::InvalidContract(msg.into())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(format!("TOML error: {}", err))
    }
}

/// Violations of the grading result invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    /// Point ceiling that is negative, NaN or infinite
    #[error("potential_points must be a non-negative number. received: {0}")]
    InvalidPotentialPoints(f64),

    /// Score below zero (or not finite)
    #[error("grade must be at least 0.00. received: {0}")]
    InvalidScore(f64),

    /// Score above the point ceiling
    #[error("grade must be less than or equal to potential_points ({potential_points}). received: {score}")]
    ScoreExceedsPotential { score: f64, potential_points: f64 },

    /// Result kind name outside the recognised vocabulary
    #[error("message_type must be one of {valid:?}. received: {received}")]
    UnknownResultKind {
        received: String,
        valid: Vec<&'static str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::PenaltyOutOfRange {
            category: ErrorCategory::ResponseFailed,
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "Invalid penalty for ResponseFailedError: 1.5 must be between 0.00 and 1.00"
        );
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::ParseError(msg) if msg.starts_with("JSON error")));
    }

    #[test]
    fn test_grade_error_display() {
        let err = GradeError::InvalidPotentialPoints(-1.0);
        assert_eq!(
            err.to_string(),
            "potential_points must be a non-negative number. received: -1"
        );
    }
}
