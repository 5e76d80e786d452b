//! # Type Expander
//!
//! Inlines type-to-type references within one declaration table (a
//! library's or the root document's `types:`). A reference is either a bare
//! declared name (`owner: User`, `User[]`) or a `type:` facet naming a
//! declared type, in which case the named shape is the base and the local
//! facets are layered on top (local `properties` win per key).
//!
//! Expansion descends into `properties` and `items`. Cycles terminate at
//! the configured depth bound, where the node is left as written.

use serde_json::{json, Map, Value};

/// Expand every declaration in `types` against the table itself.
pub fn expand_local_types(types: &Map<String, Value>, max_depth: usize) -> Map<String, Value> {
    types
        .iter()
        .map(|(name, fragment)| (name.clone(), expand_node(fragment, types, 0, max_depth)))
        .collect()
}

/// Expand one fragment against `table`.
pub fn expand_fragment(fragment: &Value, table: &Map<String, Value>, max_depth: usize) -> Value {
    expand_node(fragment, table, 0, max_depth)
}

fn expand_node(node: &Value, table: &Map<String, Value>, depth: usize, max: usize) -> Value {
    if depth >= max {
        return node.clone();
    }
    match node {
        Value::String(name) => expand_name(name, table, depth, max).unwrap_or_else(|| node.clone()),
        Value::Object(map) => expand_object(map, table, depth, max),
        _ => node.clone(),
    }
}

fn expand_name(name: &str, table: &Map<String, Value>, depth: usize, max: usize) -> Option<Value> {
    let name = name.trim();
    if let Some(fragment) = table.get(name) {
        return Some(expand_node(fragment, table, depth + 1, max));
    }
    let element = name.strip_suffix("[]")?;
    let fragment = table.get(element)?;
    Some(json!({
        "type": "array",
        "items": expand_node(fragment, table, depth + 1, max),
    }))
}

fn expand_object(map: &Map<String, Value>, table: &Map<String, Value>, depth: usize, max: usize) -> Value {
    let mut own = map.clone();
    let base = match own.get("type") {
        Some(Value::String(name)) => expand_name(name, table, depth, max),
        Some(Value::Object(inline)) => Some(expand_object(inline, table, depth + 1, max)),
        _ => None,
    };

    if let Some(Value::Object(properties)) = own.get_mut("properties") {
        for (_, property) in properties.iter_mut() {
            *property = expand_node(property, table, depth + 1, max);
        }
    }
    if let Some(items) = own.get_mut("items") {
        *items = expand_node(items, table, depth + 1, max);
    }

    match base {
        Some(base) => {
            own.remove("type");
            merge_fragments(base, own)
        }
        None => Value::Object(own),
    }
}

/// Layer `own` facets over an expanded `base` shape.
///
/// Mapping bases are merged key by key, with `properties` merged one level
/// deeper. A scalar base (an alias of a built-in such as `string`) becomes
/// the `type` of the result.
pub fn merge_fragments(base: Value, own: Map<String, Value>) -> Value {
    match base {
        Value::Object(mut merged) => {
            for (key, value) in own {
                if key == "properties" {
                    if let (Some(Value::Object(base_props)), Value::Object(own_props)) =
                        (merged.get_mut("properties"), &value)
                    {
                        for (name, prop) in own_props {
                            base_props.insert(name.clone(), prop.clone());
                        }
                        continue;
                    }
                }
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        Value::String(scalar) => {
            let mut merged = Map::new();
            merged.insert("type".to_string(), Value::String(scalar));
            merged.extend(own);
            Value::Object(merged)
        }
        _ => Value::Object(own),
    }
}
