//! Request and result types of the validate path.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which side of an exchange a payload belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Validate against the request body and parameters.
    #[default]
    Request,
    /// Validate against the first 2xx response.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("request"),
            Direction::Response => f.write_str("response"),
        }
    }
}

/// One payload to check against an OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Concrete request path, optionally with a `?query` string.
    pub path: String,
    /// HTTP method, any case.
    pub method: String,
    #[serde(default)]
    pub direction: Direction,
    /// JSON payload; `null` when there is no body.
    #[serde(default)]
    pub payload: Value,
    /// Request headers. Names are matched case-insensitively.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ValidationRequest {
    /// A request-direction check with no payload and no headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            direction: Direction::Request,
            payload: Value::Null,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One schema or parameter violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`address.city`, `tags[2]`).
    /// Empty for the payload root.
    pub field: String,
    pub message: String,
    /// The offending value (`null` for a missing field).
    pub value: Value,
    /// What the schema expected, when there is a short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value,
            expected: None,
        }
    }

    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Result of one validate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// True iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_deserializes_with_defaults() {
        let request: ValidationRequest =
            serde_json::from_value(json!({"path": "/users", "method": "POST"})).unwrap();
        assert_eq!(request, ValidationRequest::new("POST", "/users"));
    }

    #[test]
    fn outcome_serializes_without_empty_expected() {
        let outcome = ValidationOutcome::from_errors(vec![FieldError::new(
            "name",
            "Required field 'name' is missing",
            Value::Null,
        )]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            json!({
                "valid": false,
                "errors": [{"field": "name", "message": "Required field 'name' is missing", "value": null}],
            })
        );
    }

    #[test]
    fn direction_round_trips_lowercase() {
        assert_eq!(serde_json::to_value(Direction::Response).unwrap(), json!("response"));
        assert_eq!(Direction::Request.to_string(), "request");
    }
}
