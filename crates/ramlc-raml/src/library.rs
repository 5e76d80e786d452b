//! # Library Resolver
//!
//! Handles the top-level `uses:` block. Each entry `alias: path` names a
//! library file whose `types` and `traits` become addressable as
//! `alias.Name` from the importing text.
//!
//! A library is loaded by resolving its path relative to the importer,
//! expanding its includes, stripping any self-import, resolving its own
//! nested `uses:` recursively (bounded by [`Limits::library_depth`]), and
//! parsing the result. Its local types are then expanded against each other.
//!
//! Library type references are substituted textually into the importing
//! text, so later stages see plain inline YAML:
//!
//! | Written                | Becomes                                        |
//! |------------------------|------------------------------------------------|
//! | `type: lib.User`       | `type:` + the fragment nested below            |
//! | `type: lib.User[]`     | `type: array` + `items:` + the fragment        |
//! | `owner: lib.User`      | `owner:` + the fragment nested below           |
//! | `owners: lib.User[]`   | `owners:` + `type: array` + `items:` + fragment |
//! | `pet: lib.Cat \| nil`  | `pet:` + `type:` + a sequence of the members    |
//!
//! Library traits are not substituted; the trait resolver reads them from
//! the returned [`Library`] values. Values of `is:`, `securedBy:`,
//! `description:` and `example:` are never treated as type references.

use std::sync::LazyLock;

use ramlc_core::codec::{excerpt, parse_yaml, to_yaml};
use ramlc_core::fileset::join_relative;
use ramlc_core::{AssemblyError, CodecError, Diagnostics, FileSet, Limits, Stage};
use regex::Regex;
use serde_json::{Map, Value};

use crate::include::{strip_header, IncludeExpander};
use crate::normalize::{fix_indentation, normalize};
use crate::tree::named_map;
use crate::types::expand_local_types;

static USES_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s+([^\s:#"']+)\s*:\s*(.+?)\s*$"#).expect("uses entry regex")
});

static LIBRARY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^( *)(- +)?([^\s#:][^:]*?)\s*:\s+([A-Za-z_][\w-]*)\.([A-Za-z_][\w-]*)(\[\])?\s*(?:#.*)?$",
    )
    .expect("library reference regex")
});

static LIBRARY_UNION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( *)(- +)?([^\s#:][^:]*?)\s*:\s+([^#|\[\{][^#]*\|[^#]*?)\s*(?:#.*)?$")
        .expect("library union regex")
});

static UNION_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w-]*)\.([A-Za-z_][\w-]*)(\[\])?$").expect("union member regex")
});

/// Keys whose values never name types.
const NON_TYPE_KEYS: [&str; 4] = ["is", "securedBy", "description", "example"];

/// A loaded library.
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    /// Alias from the importing `uses:` block.
    pub alias: String,
    /// Resolved path within the file set.
    pub path: String,
    /// Declared types, expanded against each other.
    pub types: Map<String, Value>,
    /// Declared traits, keyed by bare name.
    pub traits: Map<String, Value>,
}

/// One `alias: path` line of a `uses:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesEntry {
    pub alias: String,
    pub path: String,
    /// 0-based line index within the text.
    line: usize,
}

/// Location and entries of a top-level `uses:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesBlock {
    /// 0-based index of the `uses:` line.
    pub start: usize,
    /// 0-based index one past the last line of the block.
    pub end: usize,
    pub entries: Vec<UsesEntry>,
}

/// Locate the top-level `uses:` block of `text`, if any.
pub fn find_uses_block(text: &str) -> Option<UsesBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| l.trim_end() == "uses:")?;

    let mut end = lines.len();
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if line.len() == trimmed.len() {
            end = idx;
            break;
        }
    }
    while end > start + 1 {
        let trimmed = lines[end - 1].trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            end -= 1;
        } else {
            break;
        }
    }

    let entries = lines[start + 1..end]
        .iter()
        .enumerate()
        .filter_map(|(offset, line)| {
            let content = strip_comment(line);
            let caps = USES_ENTRY.captures(content)?;
            Some(UsesEntry {
                alias: caps[1].to_string(),
                path: caps[2].trim_matches(|c| c == '"' || c == '\'').to_string(),
                line: start + 1 + offset,
            })
        })
        .collect();

    Some(UsesBlock { start, end, entries })
}

/// Remove the lines of `block` from `text`.
pub fn remove_uses_block(text: &str, block: &UsesBlock) -> String {
    let kept: Vec<&str> = text
        .lines()
        .enumerate()
        .filter(|(idx, _)| *idx < block.start || *idx >= block.end)
        .map(|(_, line)| line)
        .collect();
    rejoin(text, kept)
}

/// Loads libraries and substitutes their type references.
pub struct LibraryResolver<'a> {
    files: &'a FileSet,
    limits: Limits,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> LibraryResolver<'a> {
    pub fn new(files: &'a FileSet, limits: Limits, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            files,
            limits,
            diagnostics,
        }
    }

    /// Resolve the `uses:` block of `text` (the content of `origin`).
    ///
    /// Returns the text with library type references substituted and the
    /// `uses:` block removed, together with the loaded libraries in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// `LibraryNotFound`, `LibraryParse` or `CircularLibrary` for the first
    /// library that cannot be loaded.
    pub fn resolve(&self, text: &str, origin: &str) -> Result<(String, Vec<Library>), AssemblyError> {
        self.resolve_at(text, origin, 0)
    }

    fn resolve_at(
        &self,
        text: &str,
        origin: &str,
        depth: usize,
    ) -> Result<(String, Vec<Library>), AssemblyError> {
        let Some(block) = find_uses_block(text) else {
            return Ok((text.to_string(), Vec::new()));
        };

        let mut libraries = Vec::with_capacity(block.entries.len());
        for entry in &block.entries {
            libraries.push(self.load(entry, origin, depth)?);
        }

        let stripped = remove_uses_block(text, &block);
        Ok((substitute(&stripped, &libraries, self.diagnostics), libraries))
    }

    fn load(&self, entry: &UsesEntry, origin: &str, depth: usize) -> Result<Library, AssemblyError> {
        let circular = || AssemblyError::CircularLibrary {
            alias: entry.alias.clone(),
            path: join_relative(origin, &entry.path),
        };
        if depth >= self.limits.library_depth {
            return Err(circular());
        }

        let Some((path, raw)) = self.files.resolve(origin, &entry.path) else {
            return Err(AssemblyError::LibraryNotFound {
                alias: entry.alias.clone(),
                path: entry.path.clone(),
            });
        };
        self.diagnostics
            .note(Stage::Library, format!("loading library '{}' from '{path}'", entry.alias));

        let includes = IncludeExpander::new(self.files, self.limits, self.diagnostics);
        let text = includes.expand(&strip_header(&fix_indentation(raw)), &path)?;
        let text = self.strip_self_import(&text, &path, &entry.alias)?;
        let (text, _nested) = self.resolve_at(&text, &path, depth + 1)?;

        let tree = parse_yaml(&normalize(&text, self.diagnostics)).map_err(|err| {
            let (message, excerpt_text) = match err {
                CodecError::Parse { message, line, .. } => {
                    (message, line.map(|l| excerpt(&text, l)).unwrap_or_default())
                }
                other => (other.to_string(), String::new()),
            };
            AssemblyError::LibraryParse {
                alias: entry.alias.clone(),
                path: path.clone(),
                message,
                excerpt: excerpt_text,
            }
        })?;

        let types = tree.get("types").map(named_map).unwrap_or_default();
        let traits = tree.get("traits").map(named_map).unwrap_or_default();
        Ok(Library {
            alias: entry.alias.clone(),
            path,
            types: expand_local_types(&types, self.limits.type_depth),
            traits,
        })
    }

    /// Drop `uses:` entries of the library at `path` that point back at itself.
    fn strip_self_import(&self, text: &str, path: &str, alias: &str) -> Result<String, AssemblyError> {
        let Some(block) = find_uses_block(text) else {
            return Ok(text.to_string());
        };
        let self_lines: Vec<usize> = block
            .entries
            .iter()
            .filter(|e| join_relative(path, &e.path) == path)
            .map(|e| e.line)
            .collect();
        if self_lines.is_empty() {
            return Ok(text.to_string());
        }
        self.diagnostics.warning(
            Stage::Library,
            format!("library '{alias}' at '{path}' imports itself; import removed"),
        );

        let stripped = if self_lines.len() == block.entries.len() {
            remove_uses_block(text, &block)
        } else {
            let kept = text
                .lines()
                .enumerate()
                .filter(|(idx, _)| !self_lines.contains(idx))
                .map(|(_, line)| line)
                .collect();
            rejoin(text, kept)
        };

        let still_circular = find_uses_block(&stripped)
            .is_some_and(|b| b.entries.iter().any(|e| join_relative(path, &e.path) == path));
        if still_circular {
            return Err(AssemblyError::CircularLibrary {
                alias: alias.to_string(),
                path: path.to_string(),
            });
        }
        Ok(stripped)
    }
}

/// Replace `alias.Name` type references in `text` with the library fragments.
///
/// Unknown names are reported and left as written.
pub fn substitute(text: &str, libraries: &[Library], diagnostics: &dyn Diagnostics) -> String {
    if libraries.is_empty() {
        return text.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let substituted = substitute_line(line, libraries, diagnostics)
            .or_else(|| substitute_union_line(line, libraries, diagnostics));
        match substituted {
            Some(lines) => out.extend(lines),
            None => out.push(line.to_string()),
        }
    }
    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

fn substitute_line(line: &str, libraries: &[Library], diagnostics: &dyn Diagnostics) -> Option<Vec<String>> {
    if line.trim_start().starts_with('#') {
        return None;
    }
    let caps = LIBRARY_REFERENCE.captures(line)?;
    if NON_TYPE_KEYS.contains(&caps[3].trim()) {
        return None;
    }
    let alias = &caps[4];
    let name = &caps[5];
    let library = libraries.iter().find(|lib| lib.alias == alias)?;
    if library.traits.contains_key(name) && !library.types.contains_key(name) {
        return None;
    }
    let Some(fragment) = library.types.get(name) else {
        diagnostics.warning(
            Stage::Library,
            format!("type '{alias}.{name}' not declared in library '{}'", library.path),
        );
        return None;
    };

    let indent = caps.get(1).map_or("", |m| m.as_str());
    let dash = caps.get(2).map_or("", |m| m.as_str());
    let key = &caps[3];
    let prefix = format!("{indent}{dash}");
    let key_col = indent.len() + dash.len();
    let is_array = caps.get(6).is_some();

    let mut lines = Vec::new();
    let fragment_col = match (key == "type", is_array) {
        (true, false) => {
            lines.push(format!("{prefix}type:"));
            key_col + 2
        }
        (true, true) => {
            lines.push(format!("{prefix}type: array"));
            lines.push(format!("{}items:", " ".repeat(key_col)));
            key_col + 2
        }
        (false, false) => {
            lines.push(format!("{prefix}{key}:"));
            key_col + 2
        }
        (false, true) => {
            let pad = " ".repeat(key_col + 2);
            lines.push(format!("{prefix}{key}:"));
            lines.push(format!("{pad}type: array"));
            lines.push(format!("{pad}items:"));
            key_col + 4
        }
    };

    match render_fragment(fragment, fragment_col) {
        Ok(Rendered::Inline(scalar)) => {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(&scalar);
            }
        }
        Ok(Rendered::Block(block)) => lines.extend(block),
        Err(err) => {
            diagnostics.warning(
                Stage::Library,
                format!("cannot render '{alias}.{name}': {err}"),
            );
            return None;
        }
    }
    Some(lines)
}

/// Rewrite `key: a.X | b.Y[] | string` so each library member becomes its
/// fragment. The members land in a `type:` sequence, which the mapper turns
/// into `oneOf`.
fn substitute_union_line(
    line: &str,
    libraries: &[Library],
    diagnostics: &dyn Diagnostics,
) -> Option<Vec<String>> {
    if line.trim_start().starts_with('#') {
        return None;
    }
    let caps = LIBRARY_UNION.captures(line)?;
    let key = caps[3].trim();
    if NON_TYPE_KEYS.contains(&key) {
        return None;
    }
    let expression = caps[4].trim();
    if expression.contains(['(', ')']) {
        return None;
    }

    let mut members = Vec::new();
    let mut substituted = false;
    for member in expression.split('|').map(str::trim) {
        let Some(parts) = UNION_MEMBER.captures(member) else {
            members.push(Value::String(member.to_string()));
            continue;
        };
        let Some(library) = libraries.iter().find(|lib| lib.alias == parts[1]) else {
            members.push(Value::String(member.to_string()));
            continue;
        };
        let Some(fragment) = library.types.get(&parts[2]) else {
            diagnostics.warning(
                Stage::Library,
                format!("type '{member}' not declared in library '{}'", library.path),
            );
            return None;
        };
        substituted = true;
        members.push(if parts.get(3).is_some() {
            serde_json::json!({"type": "array", "items": fragment})
        } else {
            fragment.clone()
        });
    }
    if !substituted {
        return None;
    }

    let indent = caps.get(1).map_or("", |m| m.as_str());
    let dash = caps.get(2).map_or("", |m| m.as_str());
    let prefix = format!("{indent}{dash}");
    let key_col = indent.len() + dash.len();
    let mut lines = vec![format!("{prefix}{key}:")];
    let sequence_col = if key == "type" {
        key_col + 2
    } else {
        lines.push(format!("{}type:", " ".repeat(key_col + 2)));
        key_col + 4
    };
    match render_fragment(&Value::Array(members), sequence_col) {
        Ok(Rendered::Block(block)) => lines.extend(block),
        Ok(Rendered::Inline(_)) => return None,
        Err(err) => {
            diagnostics.warning(Stage::Library, format!("cannot render union '{expression}': {err}"));
            return None;
        }
    }
    Some(lines)
}

enum Rendered {
    Inline(String),
    Block(Vec<String>),
}

fn render_fragment(fragment: &Value, col: usize) -> Result<Rendered, CodecError> {
    match fragment {
        Value::Object(map) if map.is_empty() => Ok(Rendered::Inline("{}".to_string())),
        Value::Object(_) | Value::Array(_) => {
            let pad = " ".repeat(col);
            let yaml = to_yaml(fragment)?;
            Ok(Rendered::Block(
                yaml.lines().map(|l| format!("{pad}{l}")).collect(),
            ))
        }
        Value::Null => Ok(Rendered::Inline("null".to_string())),
        scalar => {
            let yaml = to_yaml(scalar)?;
            Ok(Rendered::Inline(yaml.trim_end().to_string()))
        }
    }
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn rejoin(original: &str, lines: Vec<&str>) -> String {
    let mut text = lines.join("\n");
    if original.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramlc_core::{CollectingDiagnostics, NoopDiagnostics};
    use serde_json::json;

    fn resolver<'a>(files: &'a FileSet, sink: &'a dyn Diagnostics) -> LibraryResolver<'a> {
        LibraryResolver::new(files, Limits::default(), sink)
    }

    #[test]
    fn finds_uses_block_and_entries() {
        let text = "#%RAML 1.0\ntitle: T\nuses:\n  lib: libs/common.raml # shared\n  other: \"o.raml\"\n\n/users:\n  get:\n";
        let block = find_uses_block(text).unwrap();
        assert_eq!(block.start, 2);
        assert_eq!(block.end, 5);
        let pairs: Vec<(&str, &str)> = block
            .entries
            .iter()
            .map(|e| (e.alias.as_str(), e.path.as_str()))
            .collect();
        assert_eq!(pairs, [("lib", "libs/common.raml"), ("other", "o.raml")]);
        assert_eq!(
            remove_uses_block(text, &block),
            "#%RAML 1.0\ntitle: T\n\n/users:\n  get:\n"
        );
    }

    #[test]
    fn no_uses_block_is_passthrough() {
        let files = FileSet::new();
        let (text, libs) = resolver(&files, &NoopDiagnostics)
            .resolve("title: T\n", "api.raml")
            .unwrap();
        assert_eq!(text, "title: T\n");
        assert!(libs.is_empty());
    }

    #[test]
    fn library_type_substituted_inline() {
        let files = FileSet::new().with_file(
            "libs/common.raml",
            "#%RAML 1.0 Library\ntypes:\n  User:\n    type: object\n    properties:\n      name: string\n",
        );
        let text = "title: T\nuses:\n  lib: libs/common.raml\ntypes:\n  Account:\n    type: lib.User\n";
        let (out, libs) = resolver(&files, &NoopDiagnostics).resolve(text, "api.raml").unwrap();
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].path, "libs/common.raml");
        let doc = parse_yaml(&out).unwrap();
        assert_eq!(
            doc["types"]["Account"]["type"],
            json!({"type": "object", "properties": {"name": "string"}})
        );
        assert!(doc.get("uses").is_none());
    }

    #[test]
    fn array_reference_wraps_items() {
        let files = FileSet::new().with_file(
            "lib.raml",
            "types:\n  Tag:\n    type: string\n    maxLength: 8\n",
        );
        let text = "uses:\n  l: lib.raml\ntypes:\n  Post:\n    properties:\n      tags: l.Tag[]\n      primary:\n        type: l.Tag[]\n";
        let (out, _) = resolver(&files, &NoopDiagnostics).resolve(text, "api.raml").unwrap();
        let doc = parse_yaml(&out).unwrap();
        let props = &doc["types"]["Post"]["properties"];
        assert_eq!(
            props["tags"],
            json!({"type": "array", "items": {"type": "string", "maxLength": 8}})
        );
        assert_eq!(
            props["primary"],
            json!({"type": "array", "items": {"type": "string", "maxLength": 8}})
        );
    }

    #[test]
    fn scalar_library_type_stays_inline() {
        let files = FileSet::new().with_file("lib.raml", "types:\n  Id: string\n");
        let text = "uses:\n  l: lib.raml\ntypes:\n  Thing:\n    properties:\n      id: l.Id\n";
        let (out, _) = resolver(&files, &NoopDiagnostics).resolve(text, "api.raml").unwrap();
        assert!(out.contains("      id: string\n"));
    }

    #[test]
    fn unknown_library_type_is_reported_and_kept() {
        let files = FileSet::new().with_file("lib.raml", "types:\n  Id: string\n");
        let sink = CollectingDiagnostics::new();
        let text = "uses:\n  l: lib.raml\ntypes:\n  Thing:\n    type: l.Missing\n";
        let (out, _) = resolver(&files, &sink).resolve(text, "api.raml").unwrap();
        assert!(out.contains("type: l.Missing"));
        assert_eq!(sink.warnings(Stage::Library).len(), 1);
    }

    #[test]
    fn trait_and_security_references_are_left_alone() {
        let files = FileSet::new().with_file(
            "lib.raml",
            "types:\n  Id: string\ntraits:\n  paged:\n    queryParameters:\n      page: integer\n",
        );
        let sink = CollectingDiagnostics::new();
        let text = "uses:\n  l: lib.raml\n/items:\n  is: l.paged\n  get:\n    securedBy: l.oauth\n    is: l.paged\n";
        let (out, _) = resolver(&files, &sink).resolve(text, "api.raml").unwrap();
        assert_eq!(out, "/items:\n  is: l.paged\n  get:\n    securedBy: l.oauth\n    is: l.paged\n");
        assert!(sink.warnings(Stage::Library).is_empty());
    }

    #[test]
    fn union_members_are_substituted() {
        let files = FileSet::new().with_file(
            "lib.raml",
            "types:\n  Cat:\n    type: object\n    properties:\n      purrs: boolean\n  Tag: string\n",
        );
        let text = "uses:\n  l: lib.raml\ntypes:\n  Pet:\n    type: l.Cat | nil\n  Owner:\n    properties:\n      pet: l.Cat | l.Tag[] # either\n";
        let (out, _) = resolver(&files, &NoopDiagnostics).resolve(text, "api.raml").unwrap();
        let doc = parse_yaml(&out).unwrap();
        let cat = json!({"type": "object", "properties": {"purrs": "boolean"}});
        assert_eq!(doc["types"]["Pet"]["type"], json!([cat.clone(), "nil"]));
        assert_eq!(
            doc["types"]["Owner"]["properties"]["pet"]["type"],
            json!([cat, {"type": "array", "items": "string"}])
        );
    }

    #[test]
    fn union_with_unknown_library_member_is_reported_and_kept() {
        let files = FileSet::new().with_file("lib.raml", "types:\n  Tag: string\n");
        let sink = CollectingDiagnostics::new();
        let text = "uses:\n  l: lib.raml\ntypes:\n  T:\n    type: l.Tag | l.Gone\n";
        let (out, _) = resolver(&files, &sink).resolve(text, "api.raml").unwrap();
        assert!(out.contains("    type: l.Tag | l.Gone\n"));
        assert_eq!(sink.warnings(Stage::Library).len(), 1);
    }

    #[test]
    fn plain_unions_are_untouched() {
        let files = FileSet::new().with_file("lib.raml", "types:\n  Tag: string\n");
        let text = "uses:\n  l: lib.raml\ntypes:\n  T:\n    type: string | number\n";
        let (out, _) = resolver(&files, &NoopDiagnostics).resolve(text, "api.raml").unwrap();
        assert_eq!(out, "types:\n  T:\n    type: string | number\n");
    }

    #[test]
    fn missing_library_is_fatal() {
        let files = FileSet::new();
        let err = resolver(&files, &NoopDiagnostics)
            .resolve("uses:\n  gone: gone.raml\n", "api.raml")
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::LibraryNotFound {
                alias: "gone".into(),
                path: "gone.raml".into()
            }
        );
    }

    #[test]
    fn unparseable_library_reports_excerpt() {
        let files = FileSet::new().with_file("bad.raml", "types:\n  A: [unclosed\n  B: string\n");
        let err = resolver(&files, &NoopDiagnostics)
            .resolve("uses:\n  bad: bad.raml\n", "api.raml")
            .unwrap_err();
        match err {
            AssemblyError::LibraryParse { alias, path, excerpt, .. } => {
                assert_eq!(alias, "bad");
                assert_eq!(path, "bad.raml");
                assert!(excerpt.contains("A: [unclosed"));
            }
            other => panic!("expected LibraryParse, got {other:?}"),
        }
    }

    #[test]
    fn self_import_is_stripped() {
        let files = FileSet::new().with_file(
            "libs/self.raml",
            "uses:\n  me: self.raml\ntypes:\n  Id: string\n",
        );
        let sink = CollectingDiagnostics::new();
        let (_, libs) = resolver(&files, &sink)
            .resolve("uses:\n  s: libs/self.raml\n", "api.raml")
            .unwrap();
        assert_eq!(libs[0].types["Id"], json!("string"));
        assert_eq!(sink.warnings(Stage::Library).len(), 1);
    }

    #[test]
    fn nested_libraries_are_substituted() {
        let files = FileSet::new()
            .with_file("a.raml", "uses:\n  b: b.raml\ntypes:\n  Wrapper:\n    properties:\n      inner: b.Inner\n")
            .with_file("b.raml", "types:\n  Inner:\n    type: integer\n");
        let (_, libs) = resolver(&files, &NoopDiagnostics)
            .resolve("uses:\n  a: a.raml\n", "api.raml")
            .unwrap();
        assert_eq!(
            libs[0].types["Wrapper"]["properties"]["inner"],
            json!({"type": "integer"})
        );
    }

    #[test]
    fn mutual_library_imports_hit_depth_bound() {
        let files = FileSet::new()
            .with_file("a.raml", "uses:\n  b: b.raml\ntypes:\n  A: string\n")
            .with_file("b.raml", "uses:\n  a: a.raml\ntypes:\n  B: string\n");
        let err = resolver(&files, &NoopDiagnostics)
            .resolve("uses:\n  a: a.raml\n", "api.raml")
            .unwrap_err();
        assert!(matches!(err, AssemblyError::CircularLibrary { .. }));
    }

    #[test]
    fn library_traits_are_collected() {
        let files = FileSet::new().with_file(
            "lib.raml",
            "traits:\n  - paged:\n      queryParameters:\n        page: integer\n",
        );
        let (_, libs) = resolver(&files, &NoopDiagnostics)
            .resolve("uses:\n  l: lib.raml\n", "api.raml")
            .unwrap();
        assert!(libs[0].traits.contains_key("paged"));
    }
}
