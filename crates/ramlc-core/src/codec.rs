//! # Document Codec
//!
//! Text ↔ tree conversion for YAML and JSON sources. The typed tree used by
//! every stage of the engine is `serde_json::Value`, a closed tagged union
//! (`Null | Bool | Number | String | Array | Object`); YAML input is parsed
//! with `serde_yaml` and converted into that union.
//!
//! ## Tags
//!
//! RAML relies on the custom `!include` tag. By the time text reaches the
//! codec, assembly has spliced every include; a surviving `!include` tag is
//! rejected with [`CodecError::UnresolvedInclude`]. Any other tag is
//! ignored and its inner value kept.

use serde_json::Value;

use crate::error::CodecError;

/// Lines of context shown on each side of a parse failure.
const EXCERPT_CONTEXT: usize = 2;

/// Parse YAML text into a JSON value tree.
pub fn parse_yaml(text: &str) -> Result<Value, CodecError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        let line = e.location().map(|loc| loc.line());
        CodecError::Parse {
            message: e.to_string(),
            line,
            excerpt: line.map(|l| excerpt(text, l)).unwrap_or_default(),
        }
    })?;
    yaml_to_json_value(&yaml)
}

/// Parse JSON text into a value tree.
pub fn parse_json(text: &str) -> Result<Value, CodecError> {
    serde_json::from_str(text).map_err(|e| {
        let line = (e.line() > 0).then_some(e.line());
        CodecError::Parse {
            message: e.to_string(),
            line,
            excerpt: line.map(|l| excerpt(text, l)).unwrap_or_default(),
        }
    })
}

/// Parse a file's text, choosing the decoder from its extension:
/// `.json` is decoded directly, everything else goes through YAML.
pub fn parse_document(path: &str, text: &str) -> Result<Value, CodecError> {
    if is_json_path(path) {
        parse_json(text)
    } else {
        parse_yaml(text)
    }
}

/// Serialize a value tree as YAML text.
pub fn to_yaml(value: &Value) -> Result<String, CodecError> {
    serde_yaml::to_string(value).map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Serialize a value tree as pretty-printed JSON text.
pub fn to_json_pretty(value: &Value) -> Result<String, CodecError> {
    serde_json::to_string_pretty(value).map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Returns true if the path has a `.json` extension.
pub fn is_json_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".json")
}

/// Render a line-numbered excerpt of `text` centred on 1-based `line`.
pub fn excerpt(text: &str, line: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() || line == 0 {
        return String::new();
    }
    let start = line.saturating_sub(EXCERPT_CONTEXT + 1);
    let end = (line + EXCERPT_CONTEXT).min(lines.len());
    (start..end)
        .map(|idx| {
            let marker = if idx + 1 == line { '>' } else { ' ' };
            format!("{marker}{:>5} | {}", idx + 1, lines[idx])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Mapping keys that are numbers or booleans (status codes such as `200:`)
/// are stringified.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, CodecError> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| CodecError::Unsupported(format!("cannot represent float {f} in JSON")))
            } else {
                Err(CodecError::Unsupported(format!("YAML number {n:?}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, CodecError> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(CodecError::Unsupported(format!("YAML map key {other:?}")))
                    }
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => {
            if tagged.tag.to_string().trim_start_matches('!') == "include" {
                let target = tagged.value.as_str().unwrap_or_default().to_string();
                return Err(CodecError::UnresolvedInclude(target));
            }
            yaml_to_json_value(&tagged.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_numeric_keys_become_strings() {
        let value = parse_yaml("responses:\n  200:\n    description: OK\n").unwrap();
        assert_eq!(value, json!({"responses": {"200": {"description": "OK"}}}));
    }

    #[test]
    fn yaml_preserves_key_order() {
        let value = parse_yaml("b: 1\na: 2\nc: 3\n").unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn residual_include_tag_is_rejected() {
        let err = parse_yaml("type: !include user.raml\n").unwrap_err();
        assert_eq!(err, CodecError::UnresolvedInclude("user.raml".into()));
    }

    #[test]
    fn other_tags_are_ignored() {
        let value = parse_yaml("a: !custom 5\n").unwrap();
        assert_eq!(value, json!({"a": 5}));
    }

    #[test]
    fn parse_error_reports_line_and_excerpt() {
        let err = parse_yaml("a: 1\nb: [unclosed\nc: 3\n").unwrap_err();
        match err {
            CodecError::Parse { line, excerpt, .. } => {
                assert!(line.is_some());
                assert!(excerpt.contains("| b: [unclosed"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn parse_document_dispatches_on_extension() {
        assert_eq!(parse_document("a.json", r#"{"x": 1}"#).unwrap(), json!({"x": 1}));
        assert_eq!(parse_document("a.yaml", "x: 1").unwrap(), json!({"x": 1}));
    }

    #[test]
    fn excerpt_marks_target_line() {
        let text = "one\ntwo\nthree\nfour\nfive\nsix";
        let ex = excerpt(text, 3);
        assert!(ex.contains(">    3 | three"));
        assert!(ex.contains("     1 | one"));
        assert!(!ex.contains("six"));
    }
}
