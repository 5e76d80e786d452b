//! # Schema Validation
//!
//! Type-directed validation of a JSON value against an OpenAPI schema
//! object. Violations are accumulated as [`FieldError`]s; a type mismatch
//! stops descent into that node but never into its siblings.
//!
//! ## Order of Checks
//!
//! 1. `$ref` is resolved first; everything below sees the target.
//! 2. `oneOf`/`anyOf` need one passing branch; `allOf` needs all.
//! 3. A declared `type` differing from the value's type is one error. A
//!    `number` value under `integer` passes this check and is re-checked
//!    for integrality in the number branch. `null` is its own type, so it
//!    fails every typed schema; `nullable` is not consulted.
//! 4. The object, array, string, number or boolean branch.
//!
//! Recursion is bounded by [`Limits::validation_depth`]; past the bound the
//! remaining subtree is not checked and a warning is reported.
//!
//! [`Limits::validation_depth`]: ramlc_core::Limits

use regex::Regex;
use ramlc_core::Stage;
use serde_json::{Map, Value};

use crate::outcome::FieldError;
use crate::refs::{ref_target, RefResolver};

/// Validates values against schemas of one document.
pub struct SchemaValidator<'r, 'a> {
    refs: &'r RefResolver<'a>,
    max_depth: usize,
}

impl<'r, 'a> SchemaValidator<'r, 'a> {
    pub fn new(refs: &'r RefResolver<'a>, max_depth: usize) -> Self {
        Self { refs, max_depth }
    }

    pub fn refs(&self) -> &'r RefResolver<'a> {
        self.refs
    }

    /// Validate `value` against `schema` (found in file `origin`), returning
    /// every violation. `field` names the value's position.
    pub fn validate(&self, value: &Value, schema: &Value, origin: &str, field: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        self.validate_into(value, schema, origin, field, &mut errors, 0);
        errors
    }

    /// Validate and append violations to `errors`.
    pub fn validate_into(
        &self,
        value: &Value,
        schema: &Value,
        origin: &str,
        field: &str,
        errors: &mut Vec<FieldError>,
        depth: usize,
    ) {
        if depth > self.max_depth {
            self.refs.diagnostics().warning(
                Stage::Validation,
                format!("validation depth bound {} reached at '{field}'", self.max_depth),
            );
            return;
        }

        let resolved;
        let (schema, origin) = if ref_target(schema).is_some() {
            resolved = self.refs.deref(schema, origin);
            (&resolved.node, resolved.file.as_str())
        } else {
            (schema, origin)
        };
        let Some(rules) = schema.as_object() else {
            return;
        };

        if !self.check_composition(value, rules, origin, field, errors, depth) {
            return;
        }

        let actual = json_type(value);
        let declared = rules.get("type").and_then(Value::as_str);
        if let Some(declared) = declared {
            if declared != actual && !(declared == "integer" && actual == "number") {
                errors.push(
                    FieldError::new(
                        field,
                        format!("Expected type '{declared}' but got '{actual}'"),
                        value.clone(),
                    )
                    .expecting(declared),
                );
                return;
            }
        }

        if declared == Some("object") || rules.contains_key("properties") {
            self.check_object(value, rules, origin, field, errors, depth);
        } else if declared == Some("array") || rules.contains_key("items") {
            self.check_array(value, rules, origin, field, errors, depth);
        } else {
            match declared {
                Some("string") => self.check_string(value, rules, field, errors),
                Some("number") | Some("integer") => check_number(value, rules, declared, field, errors),
                Some("boolean") if !value.is_boolean() => {
                    errors.push(
                        FieldError::new(field, "Expected boolean", value.clone()).expecting("boolean"),
                    );
                }
                _ => {}
            }
        }
    }

    /// Returns false if a composition keyword failed and further checks on
    /// this node would only repeat the failure.
    fn check_composition(
        &self,
        value: &Value,
        rules: &Map<String, Value>,
        origin: &str,
        field: &str,
        errors: &mut Vec<FieldError>,
        depth: usize,
    ) -> bool {
        for keyword in ["oneOf", "anyOf"] {
            let Some(Value::Array(branches)) = rules.get(keyword) else {
                continue;
            };
            if branches.is_empty() {
                continue;
            }
            let matched = branches.iter().any(|branch| {
                let mut scratch = Vec::new();
                self.validate_into(value, branch, origin, field, &mut scratch, depth + 1);
                scratch.is_empty()
            });
            if !matched {
                errors.push(
                    FieldError::new(
                        field,
                        format!("Value does not match any of the {} allowed schemas", branches.len()),
                        value.clone(),
                    )
                    .expecting(keyword),
                );
                return false;
            }
        }

        if let Some(Value::Array(branches)) = rules.get("allOf") {
            for branch in branches {
                self.validate_into(value, branch, origin, field, errors, depth + 1);
            }
        }
        true
    }

    fn check_object(
        &self,
        value: &Value,
        rules: &Map<String, Value>,
        origin: &str,
        field: &str,
        errors: &mut Vec<FieldError>,
        depth: usize,
    ) {
        let Some(object) = value.as_object() else {
            errors.push(FieldError::new(field, "Expected object", value.clone()).expecting("object"));
            return;
        };

        if let Some(Value::Array(required)) = rules.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    errors.push(
                        FieldError::new(
                            join_field(field, name),
                            format!("Required field '{name}' is missing"),
                            Value::Null,
                        )
                        .expecting("present"),
                    );
                }
            }
        }

        let properties = rules.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            for (name, property_schema) in properties {
                if let Some(property_value) = object.get(name) {
                    self.validate_into(
                        property_value,
                        property_schema,
                        origin,
                        &join_field(field, name),
                        errors,
                        depth + 1,
                    );
                }
            }
        }

        let extras = object
            .iter()
            .filter(|(name, _)| properties.map_or(true, |p| !p.contains_key(name.as_str())));
        match rules.get("additionalProperties") {
            Some(Value::Bool(false)) => {
                for (name, extra) in extras {
                    errors.push(FieldError::new(
                        join_field(field, name),
                        format!("Property '{name}' is not allowed"),
                        extra.clone(),
                    ));
                }
            }
            Some(extra_schema @ Value::Object(_)) => {
                for (name, extra) in extras {
                    self.validate_into(extra, extra_schema, origin, &join_field(field, name), errors, depth + 1);
                }
            }
            _ => {}
        }
    }

    fn check_array(
        &self,
        value: &Value,
        rules: &Map<String, Value>,
        origin: &str,
        field: &str,
        errors: &mut Vec<FieldError>,
        depth: usize,
    ) {
        let Some(items) = value.as_array() else {
            errors.push(FieldError::new(field, "Expected array", value.clone()).expecting("array"));
            return;
        };

        if let Some(item_schema) = rules.get("items") {
            for (idx, item) in items.iter().enumerate() {
                self.validate_into(item, item_schema, origin, &format!("{field}[{idx}]"), errors, depth + 1);
            }
        }

        if let Some(min) = rules.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                errors.push(
                    FieldError::new(field, format!("Array must have at least {min} items"), value.clone())
                        .expecting(format!("minItems {min}")),
                );
            }
        }
        if let Some(max) = rules.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                errors.push(
                    FieldError::new(field, format!("Array must have at most {max} items"), value.clone())
                        .expecting(format!("maxItems {max}")),
                );
            }
        }
    }

    fn check_string(&self, value: &Value, rules: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
        let Some(text) = value.as_str() else {
            errors.push(FieldError::new(field, "Expected string", value.clone()).expecting("string"));
            return;
        };

        if let Some(pattern) = rules.get("pattern").and_then(Value::as_str) {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(text) => errors.push(
                    FieldError::new(field, format!("Value does not match pattern '{pattern}'"), value.clone())
                        .expecting(pattern),
                ),
                Ok(_) => {}
                Err(err) => self.refs.diagnostics().warning(
                    Stage::Validation,
                    format!("invalid pattern '{pattern}' at '{field}' ignored: {err}"),
                ),
            }
        }

        let length = text.chars().count() as u64;
        if let Some(min) = rules.get("minLength").and_then(Value::as_u64) {
            if length < min {
                errors.push(
                    FieldError::new(field, format!("String must be at least {min} characters"), value.clone())
                        .expecting(format!("minLength {min}")),
                );
            }
        }
        if let Some(max) = rules.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                errors.push(
                    FieldError::new(field, format!("String must be at most {max} characters"), value.clone())
                        .expecting(format!("maxLength {max}")),
                );
            }
        }

        check_enum(value, rules, field, errors);
    }
}

fn check_number(
    value: &Value,
    rules: &Map<String, Value>,
    declared: Option<&str>,
    field: &str,
    errors: &mut Vec<FieldError>,
) {
    let Some(number) = value.as_f64() else {
        errors.push(FieldError::new(field, "Expected number", value.clone()).expecting("number"));
        return;
    };

    if declared == Some("integer") && number.fract() != 0.0 {
        errors.push(
            FieldError::new(field, "Expected integer but got decimal number", value.clone())
                .expecting("integer"),
        );
    }
    if let Some(min) = rules.get("minimum").and_then(Value::as_f64) {
        if number < min {
            errors.push(
                FieldError::new(field, format!("Value must be >= {min}"), value.clone())
                    .expecting(format!("minimum {min}")),
            );
        }
    }
    if let Some(max) = rules.get("maximum").and_then(Value::as_f64) {
        if number > max {
            errors.push(
                FieldError::new(field, format!("Value must be <= {max}"), value.clone())
                    .expecting(format!("maximum {max}")),
            );
        }
    }

    check_enum(value, rules, field, errors);
}

fn check_enum(value: &Value, rules: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
    let Some(Value::Array(allowed)) = rules.get("enum") else {
        return;
    };
    if !allowed.contains(value) {
        let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
        errors.push(
            FieldError::new(field, format!("Value must be one of [{}]", listed.join(", ")), value.clone())
                .expecting("enum"),
        );
    }
}

/// Schema type name of a JSON value. Every number is `number`.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Append `child` to a dotted field path.
pub fn join_field(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramlc_core::limits::MAX_VALIDATION_DEPTH;
    use ramlc_core::{CollectingDiagnostics, FileSet, NoopDiagnostics};
    use serde_json::json;

    fn check(value: Value, schema: Value) -> Vec<FieldError> {
        let root = json!({});
        let files = FileSet::new();
        let refs = RefResolver::new(&files, "openapi.yaml", &root, &NoopDiagnostics);
        SchemaValidator::new(&refs, MAX_VALIDATION_DEPTH).validate(&value, &schema, "openapi.yaml", "")
    }

    #[test]
    fn integral_float_passes_integer_schema() {
        assert!(check(json!(5.0), json!({"type": "integer"})).is_empty());
        assert!(check(json!(5), json!({"type": "integer"})).is_empty());
    }

    #[test]
    fn fractional_value_fails_integer_schema_once() {
        let errors = check(json!(5.5), json!({"type": "integer"}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("decimal"));
    }

    #[test]
    fn additional_property_rejected_once() {
        let errors = check(
            json!({"extra": 1}),
            json!({"type": "object", "properties": {}, "additionalProperties": false}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "extra");
        assert!(errors[0].message.contains("not allowed"));
    }

    #[test]
    fn missing_required_field_named() {
        let errors = check(
            json!({}),
            json!({"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
        assert!(errors[0].message.contains("missing"));
    }

    #[test]
    fn type_mismatch_stops_branch_but_not_siblings() {
        let errors = check(
            json!({"a": "text", "b": 3}),
            json!({"properties": {
                "a": {"type": "object", "required": ["x"]},
                "b": {"type": "string", "minLength": 10},
            }}),
        );
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["a", "b"]);
        assert!(errors.iter().all(|e| e.message.starts_with("Expected type")));
    }

    #[test]
    fn string_checks_fire_independently() {
        let errors = check(
            json!("toolong"),
            json!({"type": "string", "pattern": "^[0-9]+$", "maxLength": 3, "enum": ["a"]}),
        );
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn invalid_pattern_is_reported_not_fatal() {
        let root = json!({});
        let files = FileSet::new();
        let sink = CollectingDiagnostics::new();
        let refs = RefResolver::new(&files, "openapi.yaml", &root, &sink);
        let errors = SchemaValidator::new(&refs, MAX_VALIDATION_DEPTH).validate(
            &json!("abc"),
            &json!({"type": "string", "pattern": "(unclosed"}),
            "openapi.yaml",
            "code",
        );
        assert!(errors.is_empty());
        assert_eq!(sink.warnings(Stage::Validation).len(), 1);
    }

    #[test]
    fn array_elements_and_bounds() {
        let errors = check(
            json!([1, "two"]),
            json!({"type": "array", "items": {"type": "integer"}, "minItems": 3, "maxItems": 1}),
        );
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["[1]", "", ""]);
    }

    #[test]
    fn number_bounds_fire_independently() {
        let errors = check(json!(0.5), json!({"type": "integer", "minimum": 1, "maximum": 0}));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn boolean_mismatch() {
        assert_eq!(check(json!("true"), json!({"type": "boolean"})).len(), 1);
        assert!(check(json!(false), json!({"type": "boolean"})).is_empty());
    }

    #[test]
    fn null_is_a_type_mismatch_even_when_nullable() {
        let errors = check(Value::Null, json!({"type": "string", "nullable": true}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Expected type 'string' but got 'null'");
        assert_eq!(check(Value::Null, json!({"type": "string"})).len(), 1);
    }

    #[test]
    fn null_body_fails_object_schema() {
        let errors = check(
            Value::Null,
            json!({"type": "object", "nullable": true, "required": ["name"], "properties": {"name": {"type": "string"}}}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "");
    }

    #[test]
    fn null_optional_field_is_rejected() {
        let errors = check(
            json!({"nick": null}),
            json!({"type": "object", "properties": {"nick": {"type": "string", "nullable": true}}}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "nick");
    }

    #[test]
    fn one_of_needs_a_matching_branch() {
        let schema = json!({"oneOf": [{"type": "string"}, {"type": "integer"}]});
        assert!(check(json!("x"), schema.clone()).is_empty());
        assert!(check(json!(4), schema.clone()).is_empty());
        let errors = check(json!(true), schema);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected.as_deref(), Some("oneOf"));
    }

    #[test]
    fn all_of_checks_every_branch() {
        let schema = json!({"allOf": [
            {"type": "object", "required": ["a"]},
            {"type": "object", "required": ["b"]},
        ]});
        assert_eq!(check(json!({}), schema).len(), 2);
    }

    #[test]
    fn additional_properties_schema_checks_extras() {
        let errors = check(
            json!({"known": 1, "x": "no"}),
            json!({"properties": {"known": {"type": "integer"}}, "additionalProperties": {"type": "integer"}}),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "x");
    }

    #[test]
    fn ref_is_followed_before_checks() {
        let root = json!({"components": {"schemas": {"Age": {"type": "integer", "minimum": 0}}}});
        let files = FileSet::new();
        let refs = RefResolver::new(&files, "openapi.yaml", &root, &NoopDiagnostics);
        let errors = SchemaValidator::new(&refs, MAX_VALIDATION_DEPTH).validate(
            &json!({"age": -1}),
            &json!({"properties": {"age": {"$ref": "#/components/schemas/Age"}}}),
            "openapi.yaml",
            "",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "age");
    }

    #[test]
    fn dangling_ref_constrains_nothing() {
        assert!(check(json!({"any": 1}), json!({"$ref": "#/components/schemas/Missing"})).is_empty());
    }

    #[test]
    fn depth_bound_stops_recursion() {
        let root = json!({
            "components": {"schemas": {
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}}
            }}
        });
        let files = FileSet::new();
        let sink = CollectingDiagnostics::new();
        let refs = RefResolver::new(&files, "openapi.yaml", &root, &sink);
        let mut value = json!({});
        for _ in 0..5 {
            value = json!({"next": value});
        }
        let errors = SchemaValidator::new(&refs, 2).validate(
            &value,
            &json!({"$ref": "#/components/schemas/Node"}),
            "openapi.yaml",
            "",
        );
        assert!(errors.is_empty());
        assert_eq!(sink.warnings(Stage::Validation).len(), 1);
    }
}
