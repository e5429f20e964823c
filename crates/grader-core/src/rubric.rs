//! Penalty rubric
//!
//! A [`Rubric`] maps every [`ErrorCategory`] to the fraction of the potential
//! points deducted when that category is the first failure of a pass. It is
//! an immutable value: build it once, hand it to a
//! [`Grader`](crate::grader::Grader), and share it freely.
//!
//! # Sources
//!
//! - [`Rubric::default`]: canonical fractions
//! - [`Rubric::from_env`]: `AG_<CATEGORY>_PENALTY_PCT` variables over the
//!   canonical fractions
//! - [`Rubric::from_file`]: JSON, YAML or TOML mapping of category keys to
//!   fractions, e.g. `response_failed = 0.25`
//!
//! Every source rejects fractions that are not numbers or fall outside
//! `[0, 1]`. Nothing is clamped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::env::VarError;
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::taxonomy::ErrorCategory;

/// Naming rules for rubric environment variables
#[derive(Debug, Clone)]
pub struct EnvNamingConfig {
    /// Prefix for all variables (default: "AG")
    pub prefix: String,
    /// Suffix for all variables (default: "PENALTY_PCT")
    pub suffix: String,
    /// Separator between the parts (default: "_")
    pub separator: String,
}

impl Default for EnvNamingConfig {
    fn default() -> Self {
        Self {
            prefix: "AG".to_string(),
            suffix: "PENALTY_PCT".to_string(),
            separator: "_".to_string(),
        }
    }
}

impl EnvNamingConfig {
    /// Create a naming config with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Build the variable name for a category
    pub fn build_name(&self, category: ErrorCategory) -> String {
        format!(
            "{}{}{}{}{}",
            self.prefix,
            self.separator,
            category.config_key(),
            self.separator,
            self.suffix
        )
        .replace('-', "_")
        .to_uppercase()
    }
}

/// Immutable table of penalty fractions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    penalties: BTreeMap<ErrorCategory, f64>,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            penalties: ErrorCategory::ALL
                .into_iter()
                .map(|c| (c, c.canonical_penalty()))
                .collect(),
        }
    }
}

impl Rubric {
    /// Canonical rubric
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one fraction, validating it first
    pub fn with_penalty(mut self, category: ErrorCategory, fraction: f64) -> Result<Self, ConfigError> {
        let fraction = validate_penalty(category, fraction)?;
        self.penalties.insert(category, fraction);
        Ok(self)
    }

    /// Penalty fraction for a category
    pub fn penalty(&self, category: ErrorCategory) -> f64 {
        self.penalties
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.canonical_penalty())
    }

    /// All fractions, most severe category first
    pub fn penalties(&self) -> impl Iterator<Item = (ErrorCategory, f64)> + '_ {
        self.penalties.iter().map(|(c, p)| (*c, *p))
    }

    /// Whether fractions never increase from the most to the least severe category
    pub fn is_severity_ordered(&self) -> bool {
        let fractions: Vec<f64> = ErrorCategory::ALL.iter().map(|c| self.penalty(*c)).collect();
        fractions.windows(2).all(|w| w[0] >= w[1])
    }

    /// Load from the process environment with the default `AG_` naming
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(&EnvNamingConfig::default(), |name| std::env::var(name))
    }

    /// Load through an arbitrary variable lookup
    pub fn from_env_with<F>(naming: &EnvNamingConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let mut rubric = Self::default();

        for category in ErrorCategory::ALL {
            let var_name = naming.build_name(category);
            match lookup(&var_name) {
                Ok(raw) => {
                    let fraction = parse_penalty(category, &raw)?;
                    debug!(variable = %var_name, fraction, "rubric penalty overridden from environment");
                    rubric = rubric.with_penalty(category, fraction)?;
                }
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) => {
                    return Err(ConfigError::InvalidEnvEncoding(var_name));
                }
            }
        }

        Ok(rubric)
    }

    /// Load a rubric file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::file_error(format!(
                "Failed to read rubric file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let document: serde_json::Value = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(format!(
                    "'{}' (expected json, yaml or toml)",
                    other
                )))
            }
        };

        Self::from_document(&document)
    }

    /// Build from a mapping of category keys to fractions
    pub fn from_document(document: &serde_json::Value) -> Result<Self, ConfigError> {
        let entries = document
            .as_object()
            .ok_or_else(|| ConfigError::parse_error("rubric must be a mapping of category to penalty"))?;

        let mut rubric = Self::default();
        for (key, value) in entries {
            let category = ErrorCategory::from_config_key(key)?;
            let fraction = value.as_f64().ok_or_else(|| ConfigError::PenaltyNotNumeric {
                category,
                raw: value.to_string(),
            })?;
            rubric = rubric.with_penalty(category, fraction)?;
        }

        Ok(rubric)
    }
}

fn parse_penalty(category: ErrorCategory, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::PenaltyNotNumeric {
            category,
            raw: raw.to_string(),
        })
}

fn validate_penalty(category: ErrorCategory, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::PenaltyOutOfRange { category, value })
    }
}
