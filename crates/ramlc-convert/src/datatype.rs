//! # Data Type Conversion
//!
//! Converts RAML type declarations into OpenAPI schema objects.
//!
//! ## Type Names
//!
//! | RAML                 | OpenAPI                                   |
//! |----------------------|-------------------------------------------|
//! | `string`, `number`, `integer`, `boolean`, `object`, `array` | same `type` |
//! | `date-only`          | `string` / `format: date`                 |
//! | `datetime`, `datetime-only` | `string` / `format: date-time`     |
//! | `time-only`          | `string` / `format: time`                 |
//! | `file`               | `string` / `format: binary`               |
//! | `any`                | `{}`                                      |
//! | `nil`                | `nullable: true`                          |
//! | `A \| B`             | `oneOf: [A, B]`                           |
//! | `T[]`                | `type: array`, `items: T`                 |
//! | declared type name   | `$ref: #/components/schemas/<name>`       |
//!
//! ## Fragments
//!
//! Object fragments compute `required` from each property's own
//! `required: true`; a trailing `?` on a property name marks it optional
//! and is stripped. Object nodes get `additionalProperties: false` unless
//! the source sets it. A fragment that names a declared type and adds
//! `properties` or `items` inlines the declaration with the local facets
//! merged over it, so the result is one closed object rather than an
//! `allOf` whose branches reject each other's properties. Every non-`$ref` node carries `deprecated` and
//! `nullable`, the latter true unless the source fragment is required.

use std::collections::BTreeSet;

use ramlc_raml::merge_fragments;
use serde_json::{json, Map, Value};

/// Facets copied verbatim from a RAML fragment.
const PASSTHROUGH_FACETS: &[&str] = &[
    "description",
    "enum",
    "pattern",
    "format",
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
    "default",
    "example",
];

/// Prefix of component schema references.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Converts RAML declarations against the set of declared type names.
#[derive(Debug, Clone, Default)]
pub struct TypeConverter {
    declared: BTreeSet<String>,
    /// Declaration bodies, used to inline a base type extended in place.
    declarations: Map<String, Value>,
}

impl TypeConverter {
    /// A converter that knows the declared names only. A fragment extending
    /// one of them becomes an `allOf` over the `$ref`.
    pub fn new(declared: impl IntoIterator<Item = String>) -> Self {
        Self {
            declared: declared.into_iter().collect(),
            declarations: Map::new(),
        }
    }

    /// A converter over full declarations. A fragment extending a declared
    /// type with local `properties` or `items` inlines the base shape.
    pub fn from_declarations(declarations: Map<String, Value>) -> Self {
        Self {
            declared: declarations.keys().cloned().collect(),
            declarations,
        }
    }

    /// Convert one type declaration: a type name string, a fragment
    /// mapping, or `null` (an unconstrained string).
    pub fn convert(&self, fragment: &Value) -> Value {
        self.convert_in(fragment, &mut Vec::new())
    }

    /// `inlining` holds the declared bases being inlined on this branch.
    fn convert_in(&self, fragment: &Value, inlining: &mut Vec<String>) -> Value {
        match fragment {
            Value::String(name) => with_flags(self.convert_name(name), false, false),
            Value::Object(map) => self.convert_fragment(map, inlining),
            Value::Null => with_flags(json!({"type": "string"}), false, false),
            _ => json!({}),
        }
    }

    /// Convert a type expression without flags.
    pub fn convert_name(&self, expression: &str) -> Value {
        let expression = strip_parens(expression.trim());
        if let Some(group) = expression
            .strip_suffix("[]")
            .filter(|e| e.starts_with('(') && e.ends_with(')'))
        {
            return json!({"type": "array", "items": self.convert_name(group)});
        }
        if expression.contains('|') {
            let members: Vec<Value> = expression
                .split('|')
                .map(|member| self.convert_name(member))
                .collect();
            return json!({ "oneOf": members });
        }
        if let Some(element) = expression.strip_suffix("[]") {
            return json!({"type": "array", "items": self.convert_name(element)});
        }
        if let Some(builtin) = builtin(expression) {
            return builtin;
        }
        if self.declared.contains(expression) {
            return json!({ "$ref": format!("{SCHEMA_REF_PREFIX}{expression}") });
        }
        json!({"type": "string"})
    }

    fn convert_fragment(&self, map: &Map<String, Value>, inlining: &mut Vec<String>) -> Value {
        if let Some(merged) = self.inline_base(map, inlining) {
            return merged;
        }
        let base = match map.get("type") {
            Some(Value::String(name)) => self.convert_name(name),
            Some(Value::Object(inline)) => self.convert_fragment(inline, inlining),
            Some(Value::Array(members)) => {
                let members: Vec<Value> = members.iter().map(|m| self.convert_in(m, inlining)).collect();
                json!({ "oneOf": members })
            }
            _ if map.contains_key("properties") => json!({"type": "object"}),
            _ if map.contains_key("items") => json!({"type": "array"}),
            _ => json!({"type": "string"}),
        };
        if base.get("$ref").is_some() && !has_local_shape(map) {
            return base;
        }

        let mut out = match base {
            Value::Object(out) if out.contains_key("$ref") => {
                let mut wrapper = Map::new();
                wrapper.insert("allOf".into(), json!([out]));
                wrapper
            }
            Value::Object(out) => out,
            _ => Map::new(),
        };

        if let Some(Value::Object(properties)) = map.get("properties") {
            let mut converted = Map::new();
            let mut required = Vec::new();
            for (raw_name, declaration) in properties {
                let (name, optional) = match raw_name.strip_suffix('?') {
                    Some(stripped) => (stripped.to_string(), true),
                    None => (raw_name.clone(), false),
                };
                if !optional && is_required(declaration) {
                    required.push(Value::String(name.clone()));
                }
                converted.insert(name, self.convert_in(declaration, inlining));
            }
            out.entry("type").or_insert_with(|| json!("object"));
            out.insert("properties".into(), Value::Object(converted));
            if !required.is_empty() {
                out.insert("required".into(), Value::Array(required));
            }
        }

        if let Some(items) = map.get("items") {
            out.insert("items".into(), self.convert_in(items, inlining));
            out.entry("type").or_insert_with(|| json!("array"));
        }

        for facet in PASSTHROUGH_FACETS {
            if let Some(value) = map.get(*facet) {
                out.insert((*facet).to_string(), value.clone());
            }
        }
        if !out.contains_key("example") {
            if let Some(example) = map.get("examples").and_then(first_example) {
                out.insert("example".into(), example);
            }
        }
        if let Some(Value::String(title)) = map.get("displayName") {
            out.insert("title".into(), Value::String(title.clone()));
        }

        if out.get("type").and_then(Value::as_str) == Some("object") && !out.contains_key("allOf") {
            let additional = match map.get("additionalProperties") {
                Some(Value::Bool(allowed)) => Value::Bool(*allowed),
                _ => Value::Bool(false),
            };
            out.insert("additionalProperties".into(), additional);
        }

        let deprecated = map.get("deprecated").and_then(Value::as_bool).unwrap_or(false);
        let required = map.get("required").and_then(Value::as_bool) == Some(true);
        with_flags(Value::Object(out), deprecated, required)
    }
}

impl TypeConverter {
    /// Merge the declared base of `map` under its local facets and convert
    /// the result. `None` when the base is not a known declaration, the
    /// fragment adds no shape, or the base is already being inlined.
    fn inline_base(&self, map: &Map<String, Value>, inlining: &mut Vec<String>) -> Option<Value> {
        let name = map.get("type")?.as_str()?.trim();
        if !has_local_shape(map) || inlining.iter().any(|seen| seen == name) {
            return None;
        }
        let base = self.declarations.get(name)?;
        let mut own = map.clone();
        own.remove("type");
        let Value::Object(merged) = merge_fragments(base.clone(), own) else {
            return None;
        };
        inlining.push(name.to_string());
        let converted = self.convert_fragment(&merged, inlining);
        inlining.pop();
        Some(converted)
    }
}

/// Set `deprecated` and `nullable` on a non-`$ref` node.
fn with_flags(node: Value, deprecated: bool, required: bool) -> Value {
    match node {
        Value::Object(mut map) if !map.contains_key("$ref") => {
            map.insert("deprecated".into(), Value::Bool(deprecated));
            let nullable = !required || map.get("nullable").and_then(Value::as_bool) == Some(true);
            map.insert("nullable".into(), Value::Bool(nullable));
            Value::Object(map)
        }
        other => other,
    }
}

/// True if a declaration explicitly says `required: true`.
pub fn is_required(declaration: &Value) -> bool {
    declaration.get("required").and_then(Value::as_bool) == Some(true)
}

fn has_local_shape(map: &Map<String, Value>) -> bool {
    map.contains_key("properties") || map.contains_key("items")
}

fn builtin(name: &str) -> Option<Value> {
    let schema = match name {
        "string" | "number" | "integer" | "boolean" | "object" | "array" => json!({ "type": name }),
        "date-only" => json!({"type": "string", "format": "date"}),
        "datetime" | "datetime-only" => json!({"type": "string", "format": "date-time"}),
        "time-only" => json!({"type": "string", "format": "time"}),
        "file" => json!({"type": "string", "format": "binary"}),
        "any" => json!({}),
        "nil" => json!({"nullable": true}),
        _ => return None,
    };
    Some(schema)
}

fn strip_parens(expression: &str) -> &str {
    match expression.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
        Some(inner) if !inner.contains(['(', ')']) => inner.trim(),
        _ => expression,
    }
}

/// First value of a RAML `examples` map, unwrapping `{value: ...}` entries.
fn first_example(examples: &Value) -> Option<Value> {
    let first = match examples {
        Value::Object(map) => map.values().next()?,
        Value::Array(items) => items.first()?,
        _ => return None,
    };
    match first.get("value") {
        Some(value) => Some(value.clone()),
        None => Some(first.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> TypeConverter {
        TypeConverter::new(["User".to_string(), "Pet".to_string()])
    }

    #[test]
    fn scalar_builtins() {
        let c = converter();
        assert_eq!(c.convert_name("integer"), json!({"type": "integer"}));
        assert_eq!(c.convert_name("date-only"), json!({"type": "string", "format": "date"}));
        assert_eq!(c.convert_name("any"), json!({}));
    }

    #[test]
    fn declared_names_become_refs() {
        assert_eq!(
            converter().convert(&json!("User")),
            json!({"$ref": "#/components/schemas/User"})
        );
    }

    #[test]
    fn unions_become_one_of_with_array_members() {
        assert_eq!(
            converter().convert_name("string | Pet[]"),
            json!({"oneOf": [
                {"type": "string"},
                {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
            ]})
        );
    }

    #[test]
    fn parenthesized_union_array() {
        assert_eq!(
            converter().convert_name("(User | Pet)[]"),
            json!({"type": "array", "items": {"oneOf": [
                {"$ref": "#/components/schemas/User"},
                {"$ref": "#/components/schemas/Pet"},
            ]}})
        );
    }

    #[test]
    fn object_required_and_flags() {
        let out = converter().convert(&json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "required": true},
                "nick?": "string",
                "age": {"type": "integer", "minimum": 0},
            }
        }));
        assert_eq!(out["required"], json!(["id"]));
        assert_eq!(out["additionalProperties"], json!(false));
        assert_eq!(out["properties"]["id"]["nullable"], json!(false));
        assert_eq!(out["properties"]["age"]["nullable"], json!(true));
        assert_eq!(out["properties"]["age"]["minimum"], json!(0));
        assert!(out["properties"].get("nick").is_some());
        assert_eq!(out["deprecated"], json!(false));
    }

    #[test]
    fn explicit_additional_properties_is_honoured() {
        let out = converter().convert(&json!({"properties": {}, "additionalProperties": true}));
        assert_eq!(out["type"], "object");
        assert_eq!(out["additionalProperties"], json!(true));
    }

    #[test]
    fn items_and_examples() {
        let out = converter().convert(&json!({
            "type": "array",
            "items": "User",
            "examples": {"one": {"value": [{"id": "1"}]}},
        }));
        assert_eq!(out["items"], json!({"$ref": "#/components/schemas/User"}));
        assert_eq!(out["example"], json!([{"id": "1"}]));
    }

    #[test]
    fn ref_with_local_properties_uses_all_of() {
        let out = converter().convert(&json!({"type": "User", "properties": {"extra": "string"}}));
        assert_eq!(out["allOf"], json!([{"$ref": "#/components/schemas/User"}]));
        assert!(out["properties"].get("extra").is_some());
    }

    #[test]
    fn extending_a_declaration_inlines_and_merges_properties() {
        let mut declarations = Map::new();
        declarations.insert(
            "User".into(),
            json!({"type": "object", "properties": {"name": {"type": "string", "required": true}}}),
        );
        let converter = TypeConverter::from_declarations(declarations);
        let out = converter.convert(&json!({"type": "User", "properties": {"nickname": "string"}}));
        assert!(out.get("allOf").is_none());
        assert_eq!(out["type"], "object");
        assert_eq!(out["required"], json!(["name"]));
        assert!(out["properties"].get("name").is_some());
        assert!(out["properties"].get("nickname").is_some());
        assert_eq!(out["additionalProperties"], json!(false));
        assert_eq!(converter.convert(&json!("User")), json!({"$ref": "#/components/schemas/User"}));
    }

    #[test]
    fn self_extending_declaration_terminates() {
        let mut declarations = Map::new();
        declarations.insert("Loop".into(), json!({"type": "Loop", "properties": {"a": "string"}}));
        let out = TypeConverter::from_declarations(declarations)
            .convert(&json!({"type": "Loop", "properties": {"b": "string"}}));
        assert_eq!(out["allOf"], json!([{"$ref": "#/components/schemas/Loop"}]));
        assert!(out["properties"].get("a").is_some());
        assert!(out["properties"].get("b").is_some());
    }

    #[test]
    fn property_extending_its_owner_terminates() {
        let mut declarations = Map::new();
        declarations.insert(
            "Node".into(),
            json!({"type": "object", "properties": {"child": {"type": "Node", "properties": {"extra": "string"}}}}),
        );
        let out = TypeConverter::from_declarations(declarations)
            .convert(&json!({"type": "Node", "properties": {"tag": "string"}}));
        let child = &out["properties"]["child"];
        assert_eq!(child["allOf"], json!([{"$ref": "#/components/schemas/Node"}]));
        assert!(child["properties"].get("extra").is_some());
    }

    #[test]
    fn null_declaration_is_string() {
        assert_eq!(converter().convert(&Value::Null)["type"], "string");
    }
}
