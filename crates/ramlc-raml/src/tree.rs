//! Shared helpers for walking a parsed RAML tree.

use serde_json::{Map, Value};

/// HTTP method keys recognized on a resource, in output order.
pub const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Returns true if `key` names a nested resource (`/users`, `/{id}`).
pub fn is_resource_key(key: &str) -> bool {
    key.starts_with('/')
}

/// Returns true if `key` is an HTTP method key.
pub fn is_method_key(key: &str) -> bool {
    METHODS.contains(&key)
}

/// Flatten a named-declaration section into one map.
///
/// RAML accepts `traits`, `securitySchemes` and `resourceTypes` either as a
/// mapping or as a sequence of single-key mappings. Both forms produce the
/// same map; on repeated names the later entry wins.
pub fn named_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Array(items) => {
            let mut merged = Map::new();
            for item in items {
                if let Value::Object(entry) = item {
                    for (name, body) in entry {
                        merged.insert(name.clone(), body.clone());
                    }
                }
            }
            merged
        }
        _ => Map::new(),
    }
}

/// Names referenced by an `is:` or `securedBy:` value.
///
/// Accepts a scalar name, a list of names, or list entries that are
/// single-key maps carrying trait parameters (the key is the name).
pub fn reference_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(name) => vec![name.clone()],
        Value::Array(items) => items.iter().flat_map(reference_names).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_map_accepts_both_forms() {
        let mapping = json!({"paged": {"a": 1}, "secured": {"b": 2}});
        let sequence = json!([{"paged": {"a": 1}}, {"secured": {"b": 2}}]);
        assert_eq!(named_map(&mapping), named_map(&sequence));
        assert!(named_map(&json!("nope")).is_empty());
    }

    #[test]
    fn reference_names_accepts_scalar_list_and_parameterized() {
        assert_eq!(reference_names(&json!("paged")), vec!["paged"]);
        assert_eq!(
            reference_names(&json!(["paged", {"searchable": {"field": "name"}}])),
            vec!["paged", "searchable"]
        );
        assert!(reference_names(&Value::Null).is_empty());
    }

    #[test]
    fn resource_and_method_keys() {
        assert!(is_resource_key("/users"));
        assert!(!is_resource_key("get"));
        assert!(is_method_key("patch"));
        assert!(!is_method_key("description"));
    }
}
