//! Error payloads returned by the backend
//!
//! The API is not uniform about its error envelope. All of these are
//! accepted:
//!
//! ```json
//! {"error": "Invalid credentials"}
//! {"error": {"message": "Validation failed", "code": "VALIDATION", "details": [...]}}
//! {"message": "Validation failed", "code": "VALIDATION", "details": [...]}
//! ```
//!
//! `details` may be an array of `{field, message}` objects (`path`/`msg`
//! aliases included), an array of strings, or an object mapping field names
//! to messages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Normalized error payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Vec<FieldError>,
}

impl ErrorBody {
    /// Parse a response body. Returns `None` when the body is not JSON or
    /// carries none of the recognised fields.
    pub fn parse(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let Value::Object(root) = value else {
            return None;
        };

        let mut parsed = Self::default();

        match root.get("error") {
            Some(Value::String(message)) => parsed.message = Some(message.clone()),
            Some(Value::Object(inner)) => parsed.absorb(inner),
            _ => {}
        }
        parsed.absorb(&root);

        if parsed.message.is_none() && parsed.code.is_none() && parsed.details.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }

    /// Fill fields that are still empty from `object`
    fn absorb(&mut self, object: &Map<String, Value>) {
        if self.message.is_none() {
            self.message = object.get("message").and_then(Value::as_str).map(str::to_string);
        }
        if self.code.is_none() {
            self.code = object.get("code").and_then(scalar_to_string);
        }
        if self.details.is_empty() {
            if let Some(details) = object.get("details").or_else(|| object.get("errors")) {
                self.details = parse_details(details);
            }
        }
    }
}

fn parse_details(value: &Value) -> Vec<FieldError> {
    match value {
        Value::Array(items) => items.iter().filter_map(parse_detail_item).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(field, message)| {
                scalar_to_string(message).map(|message| FieldError::new(field.clone(), message))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_detail_item(item: &Value) -> Option<FieldError> {
    match item {
        Value::String(message) => Some(FieldError::new(String::new(), message.clone())),
        Value::Object(map) => {
            let field = match map.get("field").or_else(|| map.get("path")) {
                Some(Value::String(field)) => field.clone(),
                Some(Value::Array(segments)) => segments
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join("."),
                _ => String::new(),
            };
            let message = map
                .get("message")
                .or_else(|| map.get("msg"))
                .and_then(Value::as_str)?
                .to_string();
            Some(FieldError { field, message })
        }
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
