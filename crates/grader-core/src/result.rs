//! Grading result model
//!
//! A [`Grade`] is immutable once built and its constructor enforces
//! `0 <= score <= potential_points`. It serializes to the document the batch
//! driver writes per submission:
//!
//! ```json
//! {
//!   "score": 85.0,
//!   "potential_points": 100.0,
//!   "message": "First message in prompt sequence must be of type 'human'. received: 'ai'",
//!   "message_type": "IncorrectResponseValueError"
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::GradeError;
use crate::taxonomy::ErrorCategory;

/// Categorical label of a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Success,
    Failure(ErrorCategory),
}

impl ResultKind {
    pub const SUCCESS: &'static str = "Success";

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Success => Self::SUCCESS,
            ResultKind::Failure(category) => category.as_str(),
        }
    }

    /// Every name a grade may carry in `message_type`
    pub fn valid_names() -> Vec<&'static str> {
        std::iter::once(Self::SUCCESS)
            .chain(ErrorCategory::ALL.iter().map(|c| c.as_str()))
            .collect()
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ResultKind::Success => None,
            ResultKind::Failure(category) => Some(*category),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResultKind {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::SUCCESS {
            return Ok(ResultKind::Success);
        }
        s.parse::<ErrorCategory>()
            .map(ResultKind::Failure)
            .map_err(|_| GradeError::UnknownResultKind {
                received: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl From<ErrorCategory> for ResultKind {
    fn from(category: ErrorCategory) -> Self {
        ResultKind::Failure(category)
    }
}

impl Serialize for ResultKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResultKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of grading one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GradeRecord")]
pub struct Grade {
    score: f64,
    potential_points: f64,
    message: String,
    message_type: ResultKind,
}

#[derive(Deserialize)]
struct GradeRecord {
    score: f64,
    potential_points: f64,
    message: String,
    message_type: ResultKind,
}

impl TryFrom<GradeRecord> for Grade {
    type Error = GradeError;

    fn try_from(record: GradeRecord) -> Result<Self, Self::Error> {
        Grade::new(
            record.score,
            record.message,
            record.message_type,
            record.potential_points,
        )
    }
}

impl Grade {
    /// Build a grade, enforcing the score bounds
    pub fn new(
        score: f64,
        message: impl Into<String>,
        kind: ResultKind,
        potential_points: f64,
    ) -> Result<Self, GradeError> {
        check_potential_points(potential_points)?;
        if !score.is_finite() || score < 0.0 {
            return Err(GradeError::InvalidScore(score));
        }
        if score > potential_points {
            return Err(GradeError::ScoreExceedsPotential {
                score,
                potential_points,
            });
        }

        Ok(Self {
            score,
            potential_points,
            message: message.into(),
            message_type: kind,
        })
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Point ceiling this grade was computed against
    pub fn potential_points(&self) -> f64 {
        self.potential_points
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn result_kind(&self) -> ResultKind {
        self.message_type
    }

    pub fn is_success(&self) -> bool {
        self.message_type == ResultKind::Success
    }
}

/// Reject ceilings that are negative, NaN or infinite
pub fn check_potential_points(potential_points: f64) -> Result<(), GradeError> {
    if potential_points.is_finite() && potential_points >= 0.0 {
        Ok(())
    } else {
        Err(GradeError::InvalidPotentialPoints(potential_points))
    }
}
