//! # Payload Orchestration
//!
//! Locates the operation a [`ValidationRequest`] targets and runs the body
//! and parameter validators against it.
//!
//! 1. The query string is split off the path and URL-decoded.
//! 2. The path is matched exactly, else against each `{param}` template
//!    (each parameter segment matches `[^/?]+`), capturing path values.
//! 3. `$ref`s on the path item, operation, parameters, request body and
//!    responses are followed.
//! 4. Request direction: parameters are validated, then the JSON request
//!    body. A method without a declared body validates its parameters;
//!    a body-carrying method with neither body nor parameters is an error.
//! 5. Response direction: the payload is validated against the JSON schema
//!    of the first 2xx response.

use std::collections::HashMap;
use std::sync::LazyLock;

use ramlc_core::{Diagnostics, EngineConfig, EngineError, FileSet, Stage};
use regex::Regex;
use serde_json::{Map, Value};

use crate::outcome::{Direction, FieldError, ValidationOutcome, ValidationRequest};
use crate::params::{validate_parameters, ParameterValues};
use crate::refs::{Located, RefResolver};
use crate::validate::SchemaValidator;

/// Operation keys of an OpenAPI path item.
const OPERATION_KEYS: [&str; 8] = ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Methods for which a missing request body is expected.
const BODYLESS_METHODS: [&str; 3] = ["get", "head", "delete"];

static PATH_TEMPLATE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("path template regex"));

/// Validate `request` against the parsed OpenAPI `document` loaded from `entry`.
///
/// # Errors
///
/// `PathNotFound`, `MethodNotFound`, `NoRequestSchema` or
/// `NoSuccessResponse` when the request cannot be matched to a schema.
pub fn validate_document(
    files: &FileSet,
    entry: &str,
    document: &Value,
    request: &ValidationRequest,
    config: &EngineConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<ValidationOutcome, EngineError> {
    let refs = RefResolver::new(files, entry, document, diagnostics);
    let validator = SchemaValidator::new(&refs, config.limits.validation_depth);

    let (path, query) = split_query(&request.path);
    let empty = Map::new();
    let paths = document.get("paths").and_then(Value::as_object).unwrap_or(&empty);
    let Some((template, item, captured)) = match_path(paths, path) else {
        return Err(EngineError::PathNotFound {
            path: path.to_string(),
            available: paths.keys().cloned().collect(),
        });
    };
    diagnostics.note(Stage::Validation, format!("'{path}' matched path '{template}'"));

    let item = refs.deref(item, entry);
    let method = request.method.to_ascii_lowercase();
    let Some(operation) = item.node.get(&method) else {
        return Err(EngineError::MethodNotFound {
            method: request.method.to_ascii_uppercase(),
            path: template,
            available: OPERATION_KEYS
                .iter()
                .filter(|key| item.node.get(**key).is_some())
                .map(|key| key.to_ascii_uppercase())
                .collect(),
        });
    };
    let operation = refs.deref(operation, &item.file);

    let mut errors: Vec<FieldError> = Vec::new();
    match request.direction {
        Direction::Request => {
            let params = collect_parameters(&refs, &item, &operation);
            let mut values = ParameterValues::new().with_headers(&request.headers);
            values.path = captured;
            for (name, value) in query {
                values.add_query(name, value);
            }

            match operation.node.get("requestBody") {
                None => {
                    if !BODYLESS_METHODS.contains(&method.as_str()) && params.is_empty() {
                        return Err(EngineError::NoRequestSchema {
                            method: request.method.to_ascii_uppercase(),
                            path: template,
                        });
                    }
                    validate_parameters(&validator, &params, &values, &mut errors);
                }
                Some(body) => {
                    validate_parameters(&validator, &params, &values, &mut errors);
                    let body = refs.deref(body, &operation.file);
                    match json_schema(&body.node) {
                        Some(schema) => {
                            validator.validate_into(&request.payload, schema, &body.file, "", &mut errors, 0)
                        }
                        None => diagnostics.note(
                            Stage::Validation,
                            format!("request body of {method} '{template}' declares no JSON schema"),
                        ),
                    }
                }
            }
        }
        Direction::Response => {
            let responses = operation
                .node
                .get("responses")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            let Some((status, response)) = responses.iter().find(|(code, _)| code.starts_with('2')) else {
                return Err(EngineError::NoSuccessResponse {
                    method: request.method.to_ascii_uppercase(),
                    path: template,
                });
            };
            let response = refs.deref(response, &operation.file);
            match json_schema(&response.node) {
                Some(schema) => {
                    validator.validate_into(&request.payload, schema, &response.file, "", &mut errors, 0)
                }
                None => diagnostics.note(
                    Stage::Validation,
                    format!("response {status} of {method} '{template}' declares no JSON schema"),
                ),
            }
        }
    }

    Ok(ValidationOutcome::from_errors(errors))
}

/// Split `path?query` and decode the query pairs.
pub fn split_query(target: &str) -> (&str, Vec<(String, String)>) {
    match target.split_once('?') {
        Some((path, query)) => (
            path,
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        ),
        None => (target, Vec::new()),
    }
}

/// Find the path item for `target`: exact key first, then templates in
/// document order. Returns the matched key, the item, and captured values.
pub fn match_path<'d>(
    paths: &'d Map<String, Value>,
    target: &str,
) -> Option<(String, &'d Value, HashMap<String, String>)> {
    if let Some(item) = paths.get(target) {
        return Some((target.to_string(), item, HashMap::new()));
    }
    paths.iter().find_map(|(template, item)| {
        match_template(template, target).map(|captured| (template.clone(), item, captured))
    })
}

/// Match `target` against one `{param}` template.
pub fn match_template(template: &str, target: &str) -> Option<HashMap<String, String>> {
    if !template.contains('{') {
        return None;
    }
    let mut pattern = String::from("^");
    let mut names = Vec::new();
    let mut last = 0;
    for caps in PATH_TEMPLATE_PARAM.captures_iter(template) {
        let whole = caps.get(0)?;
        pattern.push_str(&regex::escape(&template[last..whole.start()]));
        pattern.push_str("([^/?]+)");
        names.push(caps[1].to_string());
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&template[last..]));
    pattern.push('$');

    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(target)?;
    Some(
        names
            .into_iter()
            .enumerate()
            .filter_map(|(idx, name)| caps.get(idx + 1).map(|m| (name, m.as_str().to_string())))
            .collect(),
    )
}

/// Path-item parameters merged with operation parameters; an operation
/// parameter replaces a path-item one with the same `name` and `in`.
fn collect_parameters(refs: &RefResolver<'_>, item: &Located, operation: &Located) -> Vec<Located> {
    let resolve_all = |owner: &Located| -> Vec<Located> {
        owner
            .node
            .get("parameters")
            .and_then(Value::as_array)
            .map(|params| params.iter().map(|p| refs.deref(p, &owner.file)).collect())
            .unwrap_or_default()
    };
    let identity = |param: &Located| {
        (
            param.node.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            param.node.get("in").and_then(Value::as_str).unwrap_or_default().to_string(),
        )
    };

    let own = resolve_all(operation);
    let mut merged: Vec<Located> = resolve_all(item)
        .into_iter()
        .filter(|inherited| !own.iter().any(|p| identity(p) == identity(inherited)))
        .collect();
    merged.extend(own);
    merged
}

/// Schema of the JSON media type of a request body or response.
fn json_schema(holder: &Value) -> Option<&Value> {
    let content = holder.get("content")?.as_object()?;
    let media = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.contains("json"))
                .map(|(_, media)| media)
        })
        .or_else(|| content.get("*/*"))?;
    media.get("schema")
}
