//! Schema contract for submitted responses
//!
//! The contract is static data: which top-level keys must exist, which
//! status code and encoding flag are accepted, how the chat memory inside the
//! body is laid out, which request metadata literals are expected and which
//! numeric settings must fall inside a range. The
//! built-in contract ships as `resources/contract.json`; callers can load an
//! alternative from disk. Either way it is loaded once and only read after
//! that.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

const BUILTIN_CONTRACT: &str = include_str!("../resources/contract.json");

/// Primitive JSON kinds a contract can demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    Array,
}

impl ValueKind {
    /// Whether a JSON value has this kind
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Number => value.is_number(),
            ValueKind::Object => value.is_object(),
            ValueKind::Array => value.is_array(),
        }
    }

    fn article(&self) -> &'static str {
        match self {
            ValueKind::Integer | ValueKind::Object | ValueKind::Array => "an",
            _ => "a",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
        };
        write!(f, "{} {}", self.article(), name)
    }
}

/// How a metadata literal is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matching {
    #[default]
    Exact,
    Prefix,
}

/// A single top-level key with its one accepted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedField<T> {
    pub key: String,
    pub expected: T,
}

/// Inclusive or exclusive limits on a numeric value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl NumericBounds {
    pub fn contains(&self, value: f64) -> bool {
        self.minimum.map_or(true, |m| value >= m)
            && self.exclusive_minimum.map_or(true, |m| value > m)
            && self.maximum.map_or(true, |m| value <= m)
    }

    pub fn is_unbounded(&self) -> bool {
        self.minimum.is_none() && self.exclusive_minimum.is_none() && self.maximum.is_none()
    }
}

impl fmt::Display for NumericBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(m) = self.exclusive_minimum {
            parts.push(format!("greater than {}", m));
        }
        if let Some(m) = self.minimum {
            parts.push(format!("at least {}", m));
        }
        if let Some(m) = self.maximum {
            parts.push(format!("at most {}", m));
        }
        if parts.is_empty() {
            write!(f, "any number")
        } else {
            write!(f, "{}", parts.join(" and "))
        }
    }
}

/// The status code key: one value means success, the rest of the range
/// is still a well-formed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCodeField {
    pub key: String,
    pub expected: i64,
    #[serde(default)]
    pub range: NumericBounds,
}

/// A required sub-key of every chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageKey {
    pub key: String,
    pub kind: ValueKind,
}

/// A required numeric request setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedField {
    pub key: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub bounds: NumericBounds,
}

/// A required request metadata identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub key: String,
    pub expected: String,
    #[serde(default)]
    pub matching: Matching,
}

impl MetadataField {
    /// Whether a received identifier satisfies this field
    pub fn accepts(&self, received: &str) -> bool {
        match self.matching {
            Matching::Exact => received == self.expected,
            Matching::Prefix => received.starts_with(&self.expected),
        }
    }
}

/// Shape of the response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyContract {
    pub key: String,
    /// Path from the body to the message list, e.g. `chat_memory.messages`
    pub messages_path: Vec<String>,
    pub min_messages: usize,
    /// Sub-key carrying the role of a message
    pub role_key: String,
    /// Roles the leading messages must carry, in order
    pub roles: Vec<String>,
    /// Roles any message may carry; empty accepts every role
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    pub message_keys: Vec<MessageKey>,
    /// Typed keys the body itself must carry besides the messages
    #[serde(default)]
    pub body_keys: Vec<MessageKey>,
    pub metadata_key: String,
    pub metadata: Vec<MetadataField>,
    #[serde(default)]
    pub metadata_bounds: Vec<BoundedField>,
}

/// Static description of an acceptable response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaContract {
    pub required_keys: Vec<String>,
    pub status_code: StatusCodeField,
    pub base64_flag: ExpectedField<bool>,
    pub body: BodyContract,
}

impl SchemaContract {
    /// The contract shipped with this crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_CONTRACT)
    }

    /// Parse and check a contract from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let contract: SchemaContract = serde_json::from_str(content)?;
        contract.check()?;
        Ok(contract)
    }

    /// Load a contract file (JSON or YAML)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::file_error(format!(
                "Failed to read contract file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let contract: SchemaContract = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(format!(
                    "'{}' (expected json or yaml)",
                    other
                )))
            }
        };
        contract.check()?;
        Ok(contract)
    }

    /// Dotted form of the messages path, relative to the body
    pub fn messages_path_display(&self) -> String {
        self.body.messages_path.join(".")
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.required_keys.is_empty() {
            return Err(ConfigError::invalid_contract("required_keys must not be empty"));
        }
        for key in [&self.status_code.key, &self.base64_flag.key, &self.body.key] {
            if !self.required_keys.contains(key) {
                return Err(ConfigError::invalid_contract(format!(
                    "'{}' must be listed in required_keys",
                    key
                )));
            }
        }
        if self.body.messages_path.is_empty() {
            return Err(ConfigError::invalid_contract("messages_path must not be empty"));
        }
        if self.body.min_messages < self.body.roles.len() {
            return Err(ConfigError::invalid_contract(format!(
                "min_messages ({}) must cover every ordered role ({})",
                self.body.min_messages,
                self.body.roles.len()
            )));
        }
        match self.body.message_keys.iter().find(|k| k.key == self.body.role_key) {
            None => {
                return Err(ConfigError::invalid_contract(format!(
                    "role key '{}' must be one of the message keys",
                    self.body.role_key
                )))
            }
            Some(role) if role.kind != ValueKind::String => {
                return Err(ConfigError::invalid_contract(format!(
                    "role key '{}' must have kind string, not {}",
                    role.key, role.kind
                )))
            }
            Some(_) => {}
        }
        if !self.body.allowed_roles.is_empty() {
            if let Some(role) = self
                .body
                .roles
                .iter()
                .find(|r| !self.body.allowed_roles.contains(r))
            {
                return Err(ConfigError::invalid_contract(format!(
                    "ordered role '{}' is not one of the allowed roles",
                    role
                )));
            }
        }
        if !self.status_code.range.contains(self.status_code.expected as f64) {
            return Err(ConfigError::invalid_contract(format!(
                "expected status code {} must be {}",
                self.status_code.expected, self.status_code.range
            )));
        }
        if let Some(field) = self
            .body
            .metadata_bounds
            .iter()
            .find(|f| !matches!(f.kind, ValueKind::Integer | ValueKind::Number))
        {
            return Err(ConfigError::invalid_contract(format!(
                "bounded field '{}' must have kind integer or number, not {}",
                field.key, field.kind
            )));
        }
        Ok(())
    }
}
