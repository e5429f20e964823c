//! Automated Grader Core
//!
//! Scores a submitted chat-completion response envelope against a fixed
//! schema contract. A submission runs through an ordered series of checks;
//! the first violated check decides the failure category, and the category's
//! penalty fraction decides how many of the potential points are deducted.
//!
//! ## Components
//!
//! - **Contract** (`contract`): static description of the accepted response.
//! - **Taxonomy** (`taxonomy`): failure categories and the `CheckFailure`
//!   each check signals.
//! - **Rubric** (`rubric`): immutable penalty fractions, from defaults, the
//!   environment or a file.
//! - **Validator** (`validator`): the ordered, short-circuiting checks.
//! - **Result** (`result`): the `Grade` value and its invariants.
//! - **Grader** (`grader`): ties the above together.
//!
//! ## Example
//!
//! ```rust
//! use grader_core::{Grader, Rubric, Submission, DEFAULT_POTENTIAL_POINTS};
//!
//! let grader = Grader::with_builtin_contract(Rubric::default()).unwrap();
//! let submission = Submission::from_text(r#"{"statusCode": 403}"#);
//! let grade = grader.grade(&submission, DEFAULT_POTENTIAL_POINTS).unwrap();
//!
//! assert_eq!(grade.result_kind().to_string(), "InvalidResponseStructureError");
//! assert!((grade.score() - 70.0).abs() < 1e-9);
//! ```

pub mod contract;
pub mod error;
pub mod grader;
pub mod result;
pub mod rubric;
pub mod taxonomy;
pub mod validator;

pub use contract::{
    BodyContract, BoundedField, ExpectedField, Matching, MessageKey, MetadataField, NumericBounds,
    SchemaContract, StatusCodeField, ValueKind,
};
pub use error::{ConfigError, GradeError};
pub use grader::{Grader, Submission, DEFAULT_POTENTIAL_POINTS, SUCCESS_MESSAGE};
pub use result::{Grade, ResultKind};
pub use rubric::{EnvNamingConfig, Rubric};
pub use taxonomy::{CheckFailure, CheckResult, ErrorCategory};
pub use validator::{Stage, Validator};

/// Crate version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
