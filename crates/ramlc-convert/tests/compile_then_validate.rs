//! Integration test: compile a RAML project, emit it as YAML, and validate
//! payloads against the emitted OpenAPI document.

use ramlc_convert::compile;
use ramlc_core::FileSet;
use ramlc_schema::{validate, Direction, ValidationOutcome, ValidationRequest};
use serde_json::{json, Value};

const USERS_API: &str = r#"#%RAML 1.0
title: Users
types:
  User:
    type: object
    properties:
      name:
        type: string
        required: true
      age?: integer
/users:
  post:
    body:
      application/json: User
    responses:
      201:
        body:
          application/json: User
  /extended:
    post:
      body:
        application/json:
          type: User
          properties:
            nickname: string
"#;

/// Compile the project and return a file set holding only the emitted document.
fn compiled_files() -> FileSet {
    let raml = FileSet::new().with_file("api.raml", USERS_API);
    let document = compile(&raml, "api.raml").unwrap();
    FileSet::new().with_file("openapi.yaml", document.to_yaml().unwrap())
}

fn post(path: &str, payload: Value) -> ValidationOutcome {
    let request = ValidationRequest::new("POST", path).with_payload(payload);
    validate(&compiled_files(), "openapi.yaml", &request).unwrap()
}

#[test]
fn test_valid_body_passes() {
    let outcome = post("/users", json!({"name": "Ada", "age": 36}));
    assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
}

#[test]
fn test_null_body_is_rejected() {
    let outcome = post("/users", Value::Null);
    assert!(!outcome.valid);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "");
    assert!(outcome.errors[0].message.contains("'null'"));
}

#[test]
fn test_missing_required_property_is_rejected() {
    let outcome = post("/users", json!({"age": 36}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "name");
}

#[test]
fn test_null_optional_property_is_rejected() {
    let outcome = post("/users", json!({"name": "Ada", "age": null}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "age");
}

#[test]
fn test_undeclared_property_is_rejected() {
    let outcome = post("/users", json!({"name": "Ada", "nickname": "a"}));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "nickname");
}

#[test]
fn test_extended_type_accepts_its_own_properties() {
    let outcome = post("/users/extended", json!({"name": "a", "nickname": "b"}));
    assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
}

#[test]
fn test_extended_type_keeps_base_constraints() {
    let outcome = post("/users/extended", json!({"nickname": "b", "other": 1}));
    let fields: Vec<&str> = outcome.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["name", "other"]);
}

#[test]
fn test_response_direction_uses_compiled_success_response() {
    let request = ValidationRequest::new("POST", "/users")
        .with_direction(Direction::Response)
        .with_payload(json!({"age": 1}));
    let outcome = validate(&compiled_files(), "openapi.yaml", &request).unwrap();
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "name");
}
