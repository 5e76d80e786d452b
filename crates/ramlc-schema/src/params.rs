//! # Parameter Validation
//!
//! Checks path, query, header and cookie parameters. Raw parameter values
//! are strings; each is coerced by its schema's `type` before schema
//! validation:
//!
//! | Schema type          | Coercion                                        |
//! |----------------------|-------------------------------------------------|
//! | `integer`, `number`  | parsed as a number; non-numeric text is an error |
//! | `boolean`            | `true` / `false`; anything else is an error     |
//! | `array`              | split on `,`, trimmed, each element coerced by `items.type`; empty segments are kept |
//! | anything else        | kept as a string                                |

use std::collections::{BTreeMap, HashMap};

use serde_json::{Number, Value};

use crate::outcome::FieldError;
use crate::refs::Located;
use crate::validate::SchemaValidator;

/// Raw parameter values of one request, grouped by location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterValues {
    pub path: HashMap<String, String>,
    pub query: HashMap<String, String>,
    /// Keyed by lowercased header name.
    headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query pair. A repeated name accumulates as a comma list.
    pub fn add_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.query
            .entry(name.into())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Record every header of `headers`.
    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        for (name, value) in headers {
            self.set_header(name, value.clone());
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    fn lookup(&self, location: &str, name: &str) -> Option<&String> {
        match location {
            "path" => self.path.get(name),
            "query" => self.query.get(name),
            "header" => self.header(name),
            "cookie" => self.cookies.get(name),
            _ => None,
        }
    }
}

/// Validate every parameter of `params` (already `$ref`-resolved, each with
/// the file it came from) against `values`.
pub fn validate_parameters(
    validator: &SchemaValidator<'_, '_>,
    params: &[Located],
    values: &ParameterValues,
    errors: &mut Vec<FieldError>,
) {
    for param in params {
        let Some(name) = param.node.get("name").and_then(Value::as_str) else {
            continue;
        };
        let location = param.node.get("in").and_then(Value::as_str).unwrap_or("query");
        let required = param.node.get("required").and_then(Value::as_bool).unwrap_or(false);

        let Some(raw) = values.lookup(location, name) else {
            if required {
                errors.push(
                    FieldError::new(
                        name,
                        format!("Required {location} parameter '{name}' is missing"),
                        Value::Null,
                    )
                    .expecting("present"),
                );
            }
            continue;
        };

        let Some(schema) = param.node.get("schema") else {
            continue;
        };
        let schema = validator.refs().deref(schema, &param.file);
        match coerce(raw, &schema.node, validator, &schema.file) {
            Ok(value) => {
                validator.validate_into(&value, &schema.node, &schema.file, name, errors, 0)
            }
            Err(expected) => errors.push(
                FieldError::new(
                    name,
                    format!("Expected {expected} but got '{raw}'"),
                    Value::String(raw.clone()),
                )
                .expecting(expected),
            ),
        }
    }
}

/// Coerce a raw string by `schema`'s `type`. On failure returns the
/// expected type name.
pub fn coerce(
    raw: &str,
    schema: &Value,
    validator: &SchemaValidator<'_, '_>,
    origin: &str,
) -> Result<Value, String> {
    match schema.get("type").and_then(Value::as_str) {
        Some(kind @ ("integer" | "number")) => parse_number(raw).ok_or_else(|| kind.to_string()),
        Some("boolean") => match raw.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err("boolean".to_string()),
        },
        Some("array") => {
            let items = schema
                .get("items")
                .map(|items| validator.refs().deref(items, origin));
            raw.split(',')
                .map(str::trim)
                .map(|segment| match &items {
                    Some(items) => coerce(segment, &items.node, validator, &items.file),
                    None => Ok(Value::String(segment.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let text = raw.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    let float = text.parse::<f64>().ok()?;
    Number::from_f64(float).map(Value::Number)
}
