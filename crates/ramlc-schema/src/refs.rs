//! # Reference Resolution
//!
//! Resolves `$ref` pointers against the entry document and against other
//! files of the same [`FileSet`].
//!
//! ## Ref Shapes
//!
//! - Internal: `#/components/schemas/User`, walked over the document that
//!   contains the reference. Segments follow JSON Pointer escaping (`~1`
//!   for `/`, `~0` for `~`).
//! - External: `./models/user.yaml#/User` or a bare `models/user.json`. The
//!   file part is joined to the directory of the referencing file and
//!   normalized; the loaded document is cached for the resolver's lifetime.
//!
//! An unresolvable file or fragment is a soft failure: it is reported and
//! yields an empty schema, which constrains nothing.
//!
//! ## Bulk Inlining
//!
//! [`RefResolver::inline_all`] replaces every `$ref` node of a tree with its
//! recursively inlined target. A reference already being inlined further up
//! the current branch resolves to an empty schema, so cyclic schemas
//! terminate.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ramlc_core::codec::parse_document;
use ramlc_core::fileset::join_relative;
use ramlc_core::{Diagnostics, FileSet, Stage};
use serde_json::{Map, Value};

/// A resolved node and the file it was found in. Further relative
/// references inside `node` resolve against `file`.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub node: Value,
    pub file: String,
}

/// Resolves internal and external `$ref`s for one document.
pub struct RefResolver<'a> {
    files: &'a FileSet,
    entry: String,
    root: &'a Value,
    documents: RefCell<HashMap<String, Option<Rc<Value>>>>,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> RefResolver<'a> {
    /// Create a resolver for the document `root`, loaded from `entry`.
    pub fn new(
        files: &'a FileSet,
        entry: impl Into<String>,
        root: &'a Value,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self {
            files,
            entry: entry.into(),
            root,
            documents: RefCell::new(HashMap::new()),
            diagnostics,
        }
    }

    /// Path of the entry document.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// The sink soft failures are reported to.
    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics
    }

    /// Resolve `reference` as written in `origin`.
    ///
    /// Never fails: an unresolvable reference is reported and resolves to
    /// an empty object located in `origin`.
    pub fn resolve(&self, reference: &str, origin: &str) -> Located {
        match self.try_resolve(reference, origin) {
            Some(located) => located,
            None => {
                self.diagnostics.warning(
                    Stage::Refs,
                    format!("unresolved $ref '{reference}' in '{origin}'"),
                );
                Located {
                    node: Value::Object(Map::new()),
                    file: origin.to_string(),
                }
            }
        }
    }

    /// Follow `node`'s `$ref` chain, if any, until a non-reference node.
    /// A chain that revisits a reference resolves to an empty object.
    pub fn deref(&self, node: &Value, origin: &str) -> Located {
        let mut current = Located {
            node: node.clone(),
            file: origin.to_string(),
        };
        let mut seen: Vec<String> = Vec::new();
        while let Some(reference) = ref_target(&current.node) {
            let key = self.key(reference, &current.file);
            if seen.contains(&key) {
                self.diagnostics
                    .warning(Stage::Refs, format!("cyclic $ref chain through '{key}'"));
                return Located {
                    node: Value::Object(Map::new()),
                    file: current.file,
                };
            }
            seen.push(key);
            current = self.resolve(&reference.to_string(), &current.file);
        }
        current
    }

    /// Inline every `$ref` in `node`, recursively.
    pub fn inline_all(&self, node: &Value, origin: &str) -> Value {
        let mut stack = Vec::new();
        self.inline(node, origin, &mut stack)
    }

    fn inline(&self, node: &Value, origin: &str, stack: &mut Vec<String>) -> Value {
        match node {
            Value::Object(map) => {
                if let Some(reference) = ref_target(node) {
                    let key = self.key(reference, origin);
                    if stack.contains(&key) {
                        self.diagnostics.note(
                            Stage::Refs,
                            format!("cyclic $ref '{reference}' inlined as empty schema"),
                        );
                        return Value::Object(Map::new());
                    }
                    let located = self.resolve(reference, origin);
                    stack.push(key);
                    let inlined = self.inline(&located.node, &located.file, stack);
                    stack.pop();
                    return inlined;
                }
                Value::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), self.inline(v, origin, stack)))
                        .collect(),
                )
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.inline(item, origin, stack))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Canonical `file#fragment` identity of a reference.
    fn key(&self, reference: &str, origin: &str) -> String {
        let (file_part, fragment) = split_reference(reference);
        let file = if file_part.is_empty() {
            origin.to_string()
        } else {
            join_relative(origin, file_part)
        };
        format!("{file}#{fragment}")
    }

    fn try_resolve(&self, reference: &str, origin: &str) -> Option<Located> {
        let (file_part, fragment) = split_reference(reference);
        let file = if file_part.is_empty() {
            origin.to_string()
        } else {
            self.files.resolve(origin, file_part)?.0
        };

        let node = if file == self.entry {
            navigate(self.root, fragment)?.clone()
        } else {
            let document = self.document(&file)?;
            navigate(&document, fragment)?.clone()
        };
        Some(Located { node, file })
    }

    fn document(&self, path: &str) -> Option<Rc<Value>> {
        if let Some(cached) = self.documents.borrow().get(path) {
            return cached.clone();
        }
        let loaded = match self.files.get(path) {
            Some(text) => match parse_document(path, text) {
                Ok(value) => Some(Rc::new(value)),
                Err(err) => {
                    self.diagnostics
                        .warning(Stage::Refs, format!("cannot parse '{path}': {err}"));
                    None
                }
            },
            None => None,
        };
        self.documents
            .borrow_mut()
            .insert(path.to_string(), loaded.clone());
        loaded
    }
}

/// The `$ref` string of `node`, if it has one.
pub fn ref_target(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Split a reference at its first `#` into file part and fragment.
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((file, fragment)) => (file.trim(), fragment),
        None => (reference.trim(), ""),
    }
}

/// Walk `document` along a `/`-delimited fragment.
pub fn navigate<'v>(document: &'v Value, fragment: &str) -> Option<&'v Value> {
    let mut node = document;
    for raw in fragment.split('/').filter(|s| !s.is_empty()) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        node = match node {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}
