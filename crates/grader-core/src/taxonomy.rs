//! Failure categories for graded submissions
//!
//! Every check in the validator signals at most one [`CheckFailure`], and each
//! failure belongs to exactly one [`ErrorCategory`]. The category decides the
//! penalty; the message explains the violated rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::ConfigError;

/// Closed set of failure categories, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The submission could not be parsed as JSON at all
    #[serde(rename = "InvalidJSONResponseError")]
    InvalidJson,
    /// A required key or nested shape is missing
    #[serde(rename = "InvalidResponseStructureError")]
    InvalidResponseStructure,
    /// The status code is an integer but not the accepted success value
    #[serde(rename = "ResponseFailedError")]
    ResponseFailed,
    /// The value has the right type but the wrong content
    #[serde(rename = "IncorrectResponseValueError")]
    IncorrectResponseValue,
    /// The key is present but holds the wrong primitive type
    #[serde(rename = "IncorrectResponseTypeError")]
    IncorrectResponseType,
}

impl ErrorCategory {
    /// All categories in severity order
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::InvalidJson,
        ErrorCategory::InvalidResponseStructure,
        ErrorCategory::ResponseFailed,
        ErrorCategory::IncorrectResponseValue,
        ErrorCategory::IncorrectResponseType,
    ];

    /// Name used in the `message_type` field of a grade
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidJson => "InvalidJSONResponseError",
            ErrorCategory::InvalidResponseStructure => "InvalidResponseStructureError",
            ErrorCategory::ResponseFailed => "ResponseFailedError",
            ErrorCategory::IncorrectResponseValue => "IncorrectResponseValueError",
            ErrorCategory::IncorrectResponseType => "IncorrectResponseTypeError",
        }
    }

    /// Snake-case key used in rubric files and environment variable names
    pub fn config_key(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidJson => "invalid_json_response",
            ErrorCategory::InvalidResponseStructure => "invalid_response_structure",
            ErrorCategory::ResponseFailed => "response_failed",
            ErrorCategory::IncorrectResponseValue => "incorrect_response_value",
            ErrorCategory::IncorrectResponseType => "incorrect_response_type",
        }
    }

    /// Look up a category by its rubric key
    pub fn from_config_key(key: &str) -> Result<Self, ConfigError> {
        let normalized = key.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.config_key() == normalized)
            .ok_or_else(|| ConfigError::UnknownCategory(key.to_string()))
    }

    /// Penalty fraction of the canonical rubric
    pub fn canonical_penalty(&self) -> f64 {
        match self {
            ErrorCategory::InvalidJson => 0.50,
            ErrorCategory::InvalidResponseStructure => 0.30,
            ErrorCategory::ResponseFailed => 0.20,
            ErrorCategory::IncorrectResponseValue => 0.15,
            ErrorCategory::IncorrectResponseType => 0.10,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown error category: {}", s))
    }
}

/// The first violated rule of a validation pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CheckFailure {
    category: ErrorCategory,
    message: String,
}

impl CheckFailure {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidJson, message)
    }

    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidResponseStructure, message)
    }

    pub fn response_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ResponseFailed, message)
    }

    pub fn incorrect_value(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::IncorrectResponseValue, message)
    }

    pub fn incorrect_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::IncorrectResponseType, message)
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

/// Outcome of a single check or a whole validation pass
pub type CheckResult<T = ()> = Result<T, CheckFailure>;
