//! # Trait Resolver
//!
//! Applies traits declared under `traits:` (or imported from a library as
//! `alias.Name`) to every method that lists them in `is:`.
//!
//! A resource's `is:` list is inherited by all of its methods and all of its
//! descendant resources. For one method the effective list is the inherited
//! traits, outermost first, followed by the method's own `is:`.
//!
//! `headers`, `queryParameters` and `responses` are merged per key: traits
//! contribute in application order (later traits overwrite earlier ones on
//! the same key) and the method's own entries overwrite trait entries. The
//! first trait carrying a `description` supplies it when the method has none.
//! `is:` keys are removed once applied.

use ramlc_core::{Diagnostics, Stage};
use serde_json::{Map, Value};

use crate::library::Library;
use crate::tree::{is_resource_key, named_map, reference_names, METHODS};

/// Method sections merged key by key.
const MERGED_SECTIONS: [&str; 3] = ["headers", "queryParameters", "responses"];

/// Every trait addressable from the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitTable {
    entries: Map<String, Value>,
}

impl TraitTable {
    /// Collect the document's own traits and each library's traits under
    /// its alias.
    pub fn build(document: &Value, libraries: &[Library]) -> Self {
        let mut entries = document.get("traits").map(named_map).unwrap_or_default();
        for library in libraries {
            for (name, body) in &library.traits {
                entries.insert(format!("{}.{name}", library.alias), body.clone());
            }
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply traits across the resource tree of `document`, in place.
pub fn resolve_traits(document: &mut Value, libraries: &[Library], diagnostics: &dyn Diagnostics) {
    let table = TraitTable::build(document, libraries);
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let resources: Vec<String> = root.keys().filter(|k| is_resource_key(k)).cloned().collect();
    for key in resources {
        if let Some(resource) = root.get_mut(&key) {
            walk_resource(resource, &[], &table, diagnostics);
        }
    }
}

fn walk_resource(resource: &mut Value, inherited: &[String], table: &TraitTable, diagnostics: &dyn Diagnostics) {
    let Some(map) = resource.as_object_mut() else {
        return;
    };
    let mut chain = inherited.to_vec();
    if let Some(is) = map.remove("is") {
        chain.extend(reference_names(&is));
    }

    for method in METHODS {
        if let Some(node) = map.get_mut(method) {
            apply_to_method(node, &chain, table, diagnostics);
        }
    }

    let children: Vec<String> = map.keys().filter(|k| is_resource_key(k)).cloned().collect();
    for child in children {
        if let Some(node) = map.get_mut(&child) {
            walk_resource(node, &chain, table, diagnostics);
        }
    }
}

fn apply_to_method(method: &mut Value, inherited: &[String], table: &TraitTable, diagnostics: &dyn Diagnostics) {
    if method.is_null() {
        if inherited.is_empty() {
            return;
        }
        *method = Value::Object(Map::new());
    }
    let Some(map) = method.as_object_mut() else {
        return;
    };

    let mut names = inherited.to_vec();
    if let Some(is) = map.remove("is") {
        names.extend(reference_names(&is));
    }
    if names.is_empty() {
        return;
    }

    let fragments: Vec<&Value> = names
        .iter()
        .filter_map(|name| {
            let found = table.get(name);
            if found.is_none() {
                diagnostics.warning(Stage::Traits, format!("unknown trait '{name}' skipped"));
            }
            found
        })
        .collect();

    for section in MERGED_SECTIONS {
        let mut merged = Map::new();
        for fragment in &fragments {
            if let Some(Value::Object(entries)) = fragment.get(section) {
                for (key, value) in entries {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        if merged.is_empty() {
            continue;
        }
        if let Some(Value::Object(own)) = map.get(section) {
            for (key, value) in own {
                merged.insert(key.clone(), value.clone());
            }
        }
        map.insert(section.to_string(), Value::Object(merged));
    }

    let has_description = map.get("description").is_some_and(|d| !d.is_null());
    if !has_description {
        let inherited_description = fragments
            .iter()
            .find_map(|f| f.get("description").filter(|d| !d.is_null()));
        if let Some(description) = inherited_description {
            map.insert("description".to_string(), description.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramlc_core::{CollectingDiagnostics, NoopDiagnostics};
    use serde_json::json;

    #[test]
    fn method_trait_adds_query_parameters() {
        let mut doc = json!({
            "traits": {"paged": {"queryParameters": {"page": {"type": "integer"}}}},
            "/users": {"get": {"is": ["paged"]}},
        });
        resolve_traits(&mut doc, &[], &NoopDiagnostics);
        assert_eq!(
            doc["/users"]["get"],
            json!({"queryParameters": {"page": {"type": "integer"}}})
        );
    }

    #[test]
    fn resource_traits_are_inherited_by_children() {
        let mut doc = json!({
            "traits": [{"secured": {"headers": {"Authorization": {"type": "string"}}}}],
            "/orgs": {
                "is": "secured",
                "get": {},
                "/{id}": {"delete": null},
            },
        });
        resolve_traits(&mut doc, &[], &NoopDiagnostics);
        let header = json!({"Authorization": {"type": "string"}});
        assert_eq!(doc["/orgs"]["get"]["headers"], header);
        assert_eq!(doc["/orgs"]["/{id}"]["delete"]["headers"], header);
        assert!(doc["/orgs"].get("is").is_none());
    }

    #[test]
    fn later_traits_override_earlier_and_method_overrides_all() {
        let mut doc = json!({
            "traits": {
                "a": {"queryParameters": {"limit": {"maximum": 10}, "q": {"type": "string"}}},
                "b": {"queryParameters": {"limit": {"maximum": 50}}},
            },
            "/items": {
                "is": ["a"],
                "get": {
                    "is": ["b"],
                    "queryParameters": {"q": {"type": "integer"}},
                },
            },
        });
        resolve_traits(&mut doc, &[], &NoopDiagnostics);
        let params = &doc["/items"]["get"]["queryParameters"];
        assert_eq!(params["limit"], json!({"maximum": 50}));
        assert_eq!(params["q"], json!({"type": "integer"}));
        let order: Vec<&String> = params.as_object().unwrap().keys().collect();
        assert_eq!(order, ["limit", "q"]);
    }

    #[test]
    fn trait_description_fills_missing_only() {
        let mut doc = json!({
            "traits": {"t": {"description": "from trait"}},
            "/a": {
                "get": {"is": "t"},
                "post": {"is": "t", "description": "own"},
            },
        });
        resolve_traits(&mut doc, &[], &NoopDiagnostics);
        assert_eq!(doc["/a"]["get"]["description"], "from trait");
        assert_eq!(doc["/a"]["post"]["description"], "own");
    }

    #[test]
    fn library_traits_are_namespaced() {
        let mut traits = Map::new();
        traits.insert(
            "paged".into(),
            json!({"queryParameters": {"page": {"type": "integer"}}}),
        );
        let lib = Library {
            alias: "lib".into(),
            path: "lib.raml".into(),
            types: Map::new(),
            traits,
        };
        let mut doc = json!({"/x": {"get": {"is": ["lib.paged"]}}});
        resolve_traits(&mut doc, &[lib], &NoopDiagnostics);
        assert_eq!(doc["/x"]["get"]["queryParameters"]["page"]["type"], "integer");
    }

    #[test]
    fn unknown_trait_is_reported_and_skipped() {
        let sink = CollectingDiagnostics::new();
        let mut doc = json!({"/x": {"get": {"is": ["ghost"], "description": "d"}}});
        resolve_traits(&mut doc, &[], &sink);
        assert_eq!(doc["/x"]["get"], json!({"description": "d"}));
        assert_eq!(sink.warnings(Stage::Traits), vec!["unknown trait 'ghost' skipped"]);
    }

    #[test]
    fn table_counts_document_and_library_traits() {
        let doc = json!({"traits": {"a": {}, "b": {}}});
        let table = TraitTable::build(&doc, &[]);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert!(table.get("a").is_some());
    }
}
