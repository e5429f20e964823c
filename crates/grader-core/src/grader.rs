//! Grader entry point
//!
//! Turns a [`Submission`] and a point ceiling into a [`Grade`]. The grader owns
//! an immutable [`Rubric`] and a shared [`SchemaContract`]; grading is a pure
//! function of those and the submission, so one grader can serve any number
//! of calls, from any number of threads.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::contract::SchemaContract;
use crate::error::{ConfigError, GradeError};
use crate::result::{check_potential_points, Grade, ResultKind};
use crate::rubric::Rubric;
use crate::taxonomy::{CheckFailure, CheckResult};
use crate::validator::Validator;

/// Point ceiling used when the caller does not pick one
pub const DEFAULT_POTENTIAL_POINTS: f64 = 100.0;

/// Message attached to a successful grade
pub const SUCCESS_MESSAGE: &str = "Great job!";

/// A document handed in for grading
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Already parsed JSON
    Parsed(Value),
    /// Raw text that still has to be parsed
    Raw(String),
    /// Content already known not to be JSON, with the reason
    Malformed(String),
}

impl Submission {
    /// Parse text eagerly, keeping it raw when it is not JSON
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match serde_json::from_str(&text) {
            Ok(value) => Submission::Parsed(value),
            Err(_) => Submission::Raw(text),
        }
    }

    /// Parse bytes read from disk; content that is not UTF-8 cannot be JSON
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::from_text(text),
            Err(e) => Submission::Malformed(format!("invalid UTF-8: {}", e)),
        }
    }
}

impl From<Value> for Submission {
    fn from(value: Value) -> Self {
        Submission::Parsed(value)
    }
}

impl From<String> for Submission {
    fn from(text: String) -> Self {
        Submission::Raw(text)
    }
}

impl From<&str> for Submission {
    fn from(text: &str) -> Self {
        Submission::Raw(text.to_string())
    }
}

/// Scores submissions against a contract with a rubric
#[derive(Debug, Clone)]
pub struct Grader {
    rubric: Rubric,
    contract: Arc<SchemaContract>,
}

impl Grader {
    pub fn new(rubric: Rubric, contract: impl Into<Arc<SchemaContract>>) -> Self {
        Self {
            rubric,
            contract: contract.into(),
        }
    }

    /// Grader over the contract shipped with this crate
    pub fn with_builtin_contract(rubric: Rubric) -> Result<Self, ConfigError> {
        Ok(Self::new(rubric, SchemaContract::builtin()?))
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn contract(&self) -> &SchemaContract {
        &self.contract
    }

    /// Grade a submission out of `potential_points`
    ///
    /// Fails only for an invalid ceiling; every defect of the submission
    /// itself becomes a scored grade.
    pub fn grade(&self, submission: &Submission, potential_points: f64) -> Result<Grade, GradeError> {
        check_potential_points(potential_points)?;

        let outcome = match submission {
            Submission::Parsed(value) => self.validate(value),
            Submission::Raw(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => self.validate(&value),
                Err(e) => {
                    warn!(error = %e, "submission is not valid JSON");
                    Err(CheckFailure::invalid_json(format!(
                        "The response could not be parsed as JSON: {}",
                        e
                    )))
                }
            },
            Submission::Malformed(reason) => {
                warn!(reason = %reason, "submission is not valid JSON");
                Err(CheckFailure::invalid_json(format!(
                    "The response could not be parsed as JSON: {}",
                    reason
                )))
            }
        };

        let grade = self.score(outcome, potential_points)?;
        info!(
            score = grade.score(),
            potential_points,
            message_type = %grade.result_kind(),
            "submission graded"
        );
        Ok(grade)
    }

    /// Run the validator alone
    pub fn validate(&self, artifact: &Value) -> CheckResult {
        Validator::new(&self.contract).validate(artifact)
    }

    /// Convert a validation outcome into a grade
    pub fn score(&self, outcome: CheckResult, potential_points: f64) -> Result<Grade, GradeError> {
        match outcome {
            Ok(()) => Grade::new(
                potential_points,
                SUCCESS_MESSAGE,
                ResultKind::Success,
                potential_points,
            ),
            Err(failure) => {
                let category = failure.category();
                let score = potential_points * (1.0 - self.rubric.penalty(category));
                Grade::new(
                    score,
                    failure.into_message(),
                    ResultKind::Failure(category),
                    potential_points,
                )
            }
        }
    }
}
