//! Ordered validation of a submitted response
//!
//! The [`Validator`] walks a fixed sequence of [`Stage`]s. Each stage assumes
//! the previous ones passed and returns the first rule it finds violated;
//! later stages never run once one fails.

use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::contract::SchemaContract;
use crate::taxonomy::{CheckFailure, CheckResult};

/// Validation stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TopLevelShape,
    RequiredKeys,
    StatusCode,
    EncodingFlag,
    BodyShape,
    MessageRoles,
    RequestMetadata,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::TopLevelShape,
        Stage::RequiredKeys,
        Stage::StatusCode,
        Stage::EncodingFlag,
        Stage::BodyShape,
        Stage::MessageRoles,
        Stage::RequestMetadata,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TopLevelShape => write!(f, "top_level_shape"),
            Stage::RequiredKeys => write!(f, "required_keys"),
            Stage::StatusCode => write!(f, "status_code"),
            Stage::EncodingFlag => write!(f, "encoding_flag"),
            Stage::BodyShape => write!(f, "body_shape"),
            Stage::MessageRoles => write!(f, "message_roles"),
            Stage::RequestMetadata => write!(f, "request_metadata"),
        }
    }
}

/// Runs the contract's checks against one submission
pub struct Validator<'a> {
    contract: &'a SchemaContract,
}

impl<'a> Validator<'a> {
    pub fn new(contract: &'a SchemaContract) -> Self {
        Self { contract }
    }

    /// Validate a submission, stopping at the first violated rule
    pub fn validate(&self, artifact: &Value) -> CheckResult {
        let root = self.check_top_level_shape(artifact)?;
        passed(Stage::TopLevelShape);

        self.check_required_keys(root)?;
        passed(Stage::RequiredKeys);

        self.check_status_code(root)?;
        passed(Stage::StatusCode);

        self.check_encoding_flag(root)?;
        passed(Stage::EncodingFlag);

        let (body, messages) = self.check_body_shape(root)?;
        passed(Stage::BodyShape);

        self.check_message_roles(messages)?;
        passed(Stage::MessageRoles);

        self.check_request_metadata(body)?;
        passed(Stage::RequestMetadata);

        Ok(())
    }

    fn check_top_level_shape<'v>(&self, artifact: &'v Value) -> CheckResult<&'v Map<String, Value>> {
        artifact.as_object().ok_or_else(|| {
            CheckFailure::invalid_structure(format!(
                "The response must be a JSON object. received: {}",
                json_type_name(artifact)
            ))
        })
    }

    fn check_required_keys(&self, root: &Map<String, Value>) -> CheckResult {
        let missing: Vec<&str> = self
            .contract
            .required_keys
            .iter()
            .filter(|key| !root.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure::invalid_structure(format!(
                "The response is missing required keys: {}",
                missing.join(", ")
            )))
        }
    }

    fn check_status_code(&self, root: &Map<String, Value>) -> CheckResult {
        let field = &self.contract.status_code;
        let value = require(root, &field.key, "the response")?;

        let status = match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => n,
            other => {
                return Err(CheckFailure::incorrect_type(format!(
                    "{} must be an integer. received: {} ({})",
                    field.key,
                    json_type_name(other),
                    other
                )))
            }
        };

        if !status.as_f64().map_or(false, |v| field.range.contains(v)) {
            return Err(CheckFailure::invalid_structure(format!(
                "{} must be {}. received: {}",
                field.key, field.range, status
            )));
        }

        if status.as_i64() == Some(field.expected) {
            Ok(())
        } else {
            Err(CheckFailure::response_failed(format!(
                "{} must be {}. received: {}",
                field.key, field.expected, status
            )))
        }
    }

    fn check_encoding_flag(&self, root: &Map<String, Value>) -> CheckResult {
        let field = &self.contract.base64_flag;
        let value = require(root, &field.key, "the response")?;

        let flag = value.as_bool().ok_or_else(|| {
            CheckFailure::incorrect_type(format!(
                "{} must be a boolean. received: {} ({})",
                field.key,
                json_type_name(value),
                value
            ))
        })?;

        if flag == field.expected {
            Ok(())
        } else {
            Err(CheckFailure::incorrect_value(format!(
                "{} must be {}. received: {}",
                field.key, field.expected, flag
            )))
        }
    }

    fn check_body_shape<'v>(
        &self,
        root: &'v Map<String, Value>,
    ) -> CheckResult<(&'v Map<String, Value>, &'v [Value])> {
        let spec = &self.contract.body;
        let value = require(root, &spec.key, "the response")?;

        let body = value.as_object().ok_or_else(|| {
            CheckFailure::incorrect_type(format!(
                "{} must be an object. received: {}",
                spec.key,
                json_type_name(value)
            ))
        })?;

        let mut current = body;
        let mut path = spec.key.clone();
        let (last, parents) = match spec.messages_path.split_last() {
            Some(split) => split,
            None => return Err(CheckFailure::invalid_structure("the messages path is empty")),
        };

        for segment in parents {
            let next = require(current, segment, &path)?;
            path = format!("{}.{}", path, segment);
            current = next.as_object().ok_or_else(|| {
                CheckFailure::invalid_structure(format!(
                    "{} must be an object. received: {}",
                    path,
                    json_type_name(next)
                ))
            })?;
        }

        let messages_value = require(current, last, &path)?;
        let messages_path = format!("{}.{}", path, last);
        let messages = messages_value.as_array().ok_or_else(|| {
            CheckFailure::incorrect_type(format!(
                "{} must be an array. received: {}",
                messages_path,
                json_type_name(messages_value)
            ))
        })?;

        if messages.len() < spec.min_messages {
            return Err(CheckFailure::invalid_structure(format!(
                "{} must contain at least {} objects. received: {}",
                messages_path,
                spec.min_messages,
                messages.len()
            )));
        }

        if let Some((index, element)) = messages.iter().enumerate().find(|(_, m)| !m.is_object()) {
            return Err(CheckFailure::invalid_structure(format!(
                "{}[{}] must be an object. received: {}",
                messages_path,
                index,
                json_type_name(element)
            )));
        }

        for required in &spec.body_keys {
            let value = require(body, &required.key, &spec.key)?;
            if !required.kind.matches(value) {
                return Err(CheckFailure::invalid_structure(format!(
                    "{}.{} must be {}. received: {}",
                    spec.key,
                    required.key,
                    required.kind,
                    json_type_name(value)
                )));
            }
        }

        Ok((body, messages.as_slice()))
    }

    fn check_message_roles(&self, messages: &[Value]) -> CheckResult {
        let spec = &self.contract.body;

        for (index, element) in messages.iter().enumerate() {
            let label = format!("message {}", index);
            let message = match element.as_object() {
                Some(message) => message,
                None => {
                    return Err(CheckFailure::invalid_structure(format!(
                        "{} must be an object",
                        label
                    )))
                }
            };

            let missing: Vec<&str> = spec
                .message_keys
                .iter()
                .filter(|k| !message.contains_key(k.key.as_str()))
                .map(|k| k.key.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(CheckFailure::invalid_structure(format!(
                    "{} is missing required keys: {}",
                    label,
                    missing.join(", ")
                )));
            }

            for required in &spec.message_keys {
                let value = &message[required.key.as_str()];
                if !required.kind.matches(value) {
                    return Err(CheckFailure::incorrect_type(format!(
                        "{}.{} must be {}. received: {}",
                        label,
                        required.key,
                        required.kind,
                        json_type_name(value)
                    )));
                }
            }

            let role = message[spec.role_key.as_str()].as_str().unwrap_or_default();
            if !spec.allowed_roles.is_empty() && !spec.allowed_roles.iter().any(|r| r == role) {
                return Err(CheckFailure::invalid_structure(format!(
                    "{}.{} must be one of: {}. received: '{}'",
                    label,
                    spec.role_key,
                    spec.allowed_roles.join(", "),
                    role
                )));
            }

            if let Some(expected_role) = spec.roles.get(index) {
                if role != expected_role.as_str() {
                    return Err(CheckFailure::incorrect_value(format!(
                        "{} in prompt sequence must be of {} '{}'. received: '{}'",
                        ordinal(index),
                        spec.role_key,
                        expected_role,
                        role
                    )));
                }
            }
        }

        Ok(())
    }

    fn check_request_metadata(&self, body: &Map<String, Value>) -> CheckResult {
        let spec = &self.contract.body;
        let path = format!("{}.{}", spec.key, spec.metadata_key);

        let value = require(body, &spec.metadata_key, &spec.key)?;
        let metadata = value.as_object().ok_or_else(|| {
            CheckFailure::invalid_structure(format!(
                "{} must be an object. received: {}",
                path,
                json_type_name(value)
            ))
        })?;

        let missing: Vec<&str> = spec
            .metadata
            .iter()
            .filter(|f| metadata.get(f.key.as_str()).map_or(true, Value::is_null))
            .map(|f| f.key.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(CheckFailure::invalid_structure(format!(
                "{} is missing required keys: {}",
                path,
                missing.join(", ")
            )));
        }

        for field in &spec.metadata_bounds {
            let value = require(metadata, &field.key, &path)?;
            let in_range = field.kind.matches(value)
                && value.as_f64().map_or(false, |v| field.bounds.contains(v));
            if !in_range {
                return Err(CheckFailure::invalid_structure(format!(
                    "{}.{} must be {} {}. received: {}",
                    path, field.key, field.kind, field.bounds, value
                )));
            }
        }

        for field in &spec.metadata {
            let value = &metadata[field.key.as_str()];
            let received = value.as_str().ok_or_else(|| {
                CheckFailure::incorrect_type(format!(
                    "{}.{} must be a string. received: {}",
                    path,
                    field.key,
                    json_type_name(value)
                ))
            })?;

            if !field.accepts(received) {
                return Err(CheckFailure::incorrect_value(format!(
                    "{} must be {}. received: {}",
                    field.key, field.expected, received
                )));
            }
        }

        Ok(())
    }
}

fn passed(stage: Stage) {
    debug!(stage = %stage, "validation stage passed");
}

fn require<'v>(map: &'v Map<String, Value>, key: &str, parent: &str) -> CheckResult<&'v Value> {
    map.get(key).ok_or_else(|| {
        CheckFailure::invalid_structure(format!("{} is missing required key: {}", parent, key))
    })
}

fn ordinal(index: usize) -> String {
    match index {
        0 => "First message".to_string(),
        1 => "Second message".to_string(),
        2 => "Third message".to_string(),
        n => format!("Message {}", n + 1),
    }
}

/// Get the JSON type name
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::ErrorCategory;
    use serde_json::json;

    fn valid_response() -> Value {
        json!({
            "isBase64Encoded": false,
            "statusCode": 200,
            "body": {
                "chat_memory": {
                    "messages": [
                        {"content": "hello", "additional_kwargs": {}, "type": "human", "example": false},
                        {"content": "hi there", "additional_kwargs": {}, "type": "ai", "example": false}
                    ]
                },
                "return_messages": true,
                "request_meta_data": {
                    "lambda": "lambda_langchain",
                    "model": "gpt-3.5-turbo",
                    "end_point": "ChatCompletion",
                    "temperature": 0.5,
                    "max_tokens": 256
                }
            }
        })
    }

    fn run(artifact: &Value) -> CheckResult {
        let contract = SchemaContract::builtin().unwrap();
        Validator::new(&contract).validate(artifact)
    }

    fn category_of(artifact: &Value) -> ErrorCategory {
        run(artifact).unwrap_err().category()
    }

    #[test]
    fn test_valid_response_passes() {
        assert!(run(&valid_response()).is_ok());
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = run(&json!(["statusCode"])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert!(err.message().contains("array"));
    }

    #[test]
    fn test_missing_keys_are_named() {
        let err = run(&json!({"statusCode": 200})).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "The response is missing required keys: isBase64Encoded, body"
        );
    }

    #[test]
    fn test_status_code_checks() {
        let mut response = valid_response();
        response["statusCode"] = json!("200");
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        response["statusCode"] = json!(200.0);
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        response["statusCode"] = json!(403);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ResponseFailed);
        assert_eq!(err.message(), "statusCode must be 200. received: 403");
    }

    #[test]
    fn test_status_code_outside_range_is_structure_error() {
        let mut response = valid_response();
        response["statusCode"] = json!(700);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "statusCode must be at least 200 and at most 599. received: 700"
        );

        response["statusCode"] = json!(199);
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        response["statusCode"] = json!(599);
        assert_eq!(category_of(&response), ErrorCategory::ResponseFailed);
    }

    #[test]
    fn test_return_messages_is_required_boolean() {
        let mut response = valid_response();
        response["body"].as_object_mut().unwrap().remove("return_messages");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(err.message(), "body is missing required key: return_messages");

        let mut response = valid_response();
        response["body"]["return_messages"] = json!("yes");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "body.return_messages must be a boolean. received: string"
        );

        let mut response = valid_response();
        response["body"]["return_messages"] = json!(false);
        assert!(run(&response).is_ok());
    }

    #[test]
    fn test_encoding_flag_checks() {
        let mut response = valid_response();
        response["isBase64Encoded"] = json!("false");
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        response["isBase64Encoded"] = json!(true);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncorrectResponseValue);
        assert_eq!(err.message(), "isBase64Encoded must be false. received: true");
    }

    #[test]
    fn test_body_shape_checks() {
        let mut response = valid_response();
        response["body"] = json!("text");
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        let mut response = valid_response();
        response["body"].as_object_mut().unwrap().remove("chat_memory");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(err.message(), "body is missing required key: chat_memory");

        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"] = json!({"0": {}});
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"].as_array_mut().unwrap().pop();
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert!(err.message().contains("at least 2"));

        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"][1] = json!("ai: hi");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert!(err.message().starts_with("body.chat_memory.messages[1]"));
    }

    #[test]
    fn test_message_role_checks() {
        let mut response = valid_response();
        let messages = response["body"]["chat_memory"]["messages"].as_array_mut().unwrap();
        messages.swap(0, 1);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncorrectResponseValue);
        assert_eq!(
            err.message(),
            "First message in prompt sequence must be of type 'human'. received: 'ai'"
        );

        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"][1]
            .as_object_mut()
            .unwrap()
            .remove("example");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(err.message(), "message 1 is missing required keys: example");

        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"][0]["additional_kwargs"] = json!([]);
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);
    }

    #[test]
    fn test_unknown_role_is_structure_error() {
        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"]
            .as_array_mut()
            .unwrap()
            .push(json!({"content": "beep", "additional_kwargs": {}, "type": "robot", "example": false}));
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "message 2.type must be one of: human, ai, assistant. received: 'robot'"
        );

        // Vocabulary is checked before position
        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"][0]["type"] = json!("system");
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);
    }

    #[test]
    fn test_extra_messages_are_not_role_checked() {
        let mut response = valid_response();
        response["body"]["chat_memory"]["messages"]
            .as_array_mut()
            .unwrap()
            .push(json!({"content": "more", "additional_kwargs": {}, "type": "assistant", "example": false}));
        assert!(run(&response).is_ok());
    }

    #[test]
    fn test_request_metadata_checks() {
        let mut response = valid_response();
        response["body"].as_object_mut().unwrap().remove("request_meta_data");
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["body"]["request_meta_data"] = json!("lambda_langchain");
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["body"]["request_meta_data"]["model"] = Value::Null;
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert!(err.message().ends_with("missing required keys: model"));

        let mut response = valid_response();
        response["body"]["request_meta_data"]["end_point"] = json!(7);
        assert_eq!(category_of(&response), ErrorCategory::IncorrectResponseType);

        let mut response = valid_response();
        response["body"]["request_meta_data"]["model"] = json!("gpt-4");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncorrectResponseValue);
        assert_eq!(err.message(), "model must be gpt-3.5. received: gpt-4");

        let mut response = valid_response();
        response["body"]["request_meta_data"]["lambda"] = json!("lambda_openai");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncorrectResponseValue);
        assert_eq!(err.message(), "lambda must be lambda_langchain. received: lambda_openai");

        let mut response = valid_response();
        response["body"]["request_meta_data"]["end_point"] = json!("Completion");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IncorrectResponseValue);
        assert_eq!(err.message(), "end_point must be ChatCompletion. received: Completion");
    }

    #[test]
    fn test_request_settings_bounds() {
        let mut response = valid_response();
        response["body"]["request_meta_data"]["temperature"] = json!(7.0);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "body.request_meta_data.temperature must be a number at least 0 and at most 1. received: 7.0"
        );

        let mut response = valid_response();
        response["body"]["request_meta_data"]["temperature"] = json!("0.5");
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["body"]["request_meta_data"]["max_tokens"] = json!(-3);
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "body.request_meta_data.max_tokens must be an integer greater than 0. received: -3"
        );

        let mut response = valid_response();
        response["body"]["request_meta_data"]["max_tokens"] = json!(0);
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["body"]["request_meta_data"]["max_tokens"] = json!(12.5);
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["body"]["request_meta_data"]
            .as_object_mut()
            .unwrap()
            .remove("temperature");
        let err = run(&response).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidResponseStructure);
        assert_eq!(
            err.message(),
            "body.request_meta_data is missing required key: temperature"
        );

        let mut response = valid_response();
        response["body"]["request_meta_data"]["temperature"] = json!(0);
        response["body"]["request_meta_data"]["max_tokens"] = json!(1);
        assert!(run(&response).is_ok());
    }

    #[test]
    fn test_first_violation_wins() {
        let response = json!({
            "statusCode": 500,
            "isBase64Encoded": true
        });
        assert_eq!(category_of(&response), ErrorCategory::InvalidResponseStructure);

        let mut response = valid_response();
        response["statusCode"] = json!(404);
        response["isBase64Encoded"] = json!(true);
        assert_eq!(category_of(&response), ErrorCategory::ResponseFailed);
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(Stage::ALL.len(), 7);
        assert_eq!(Stage::MessageRoles.to_string(), "message_roles");
    }
}
