//! # Include Expander
//!
//! Splices `!include` targets into the including text. Two textual shapes
//! are recognized:
//!
//! - `key: !include path`: the target becomes the block nested under `key`.
//! - `!include path` as a bare value line (optionally a `- ` sequence item).
//!
//! Targets resolve relative to the including file's directory, falling back
//! to a suffix search across the file set. Each target is indentation-fixed,
//! stripped of its `#%RAML` header line, expanded recursively, and re-indented
//! relative to its own minimum indentation plus the host column.
//!
//! Targets under documentation directories (`doc/`, `docs/`,
//! `documentation/`) are replaced by an empty placeholder. Non-YAML targets
//! (`.md`, `.txt`, ...) included under a key are spliced as a literal block
//! scalar. Expansion repeats in whole-text passes, bounded by
//! [`Limits::include_passes`], until no directive remains.

use std::sync::LazyLock;

use ramlc_core::fileset::{is_documentation_path, join_relative};
use ramlc_core::{AssemblyError, Diagnostics, FileSet, Limits, Stage};
use regex::Regex;

use crate::normalize::fix_indentation;

/// Placeholder value substituted for skipped includes.
const PLACEHOLDER: &str = "\"\"";

/// Extensions whose content is spliced as YAML structure.
const STRUCTURED_EXTENSIONS: &[&str] = &["raml", "yaml", "yml", "json"];

static KEYED_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( *)(- +)?([^\s#:][^:]*?)\s*:\s+!include\s+(.+?)\s*$").expect("keyed include regex")
});

static BARE_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( *)(- +)?!include\s+(.+?)\s*$").expect("bare include regex")
});

static SIMPLE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s#:\[\{][^:]*:(\s|$)").expect("simple key regex"));

/// One `!include` directive found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Keyed {
        /// Leading spaces plus any `- ` marker.
        prefix: String,
        /// Column at which the key starts.
        key_col: usize,
        key: String,
        target: String,
    },
    Bare {
        indent: usize,
        dashed: bool,
        target: String,
    },
}

impl Directive {
    fn parse(line: &str) -> Option<Self> {
        if line.trim_start().starts_with('#') {
            return None;
        }
        if let Some(caps) = BARE_INCLUDE.captures(line) {
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            return Some(Directive::Bare {
                indent,
                dashed: caps.get(2).is_some(),
                target: clean_target(caps.get(3).map_or("", |m| m.as_str())),
            });
        }
        let caps = KEYED_INCLUDE.captures(line)?;
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let dash = caps.get(2).map_or("", |m| m.as_str());
        Some(Directive::Keyed {
            prefix: format!("{indent}{dash}"),
            key_col: indent.len() + dash.len(),
            key: caps.get(3).map_or("", |m| m.as_str()).to_string(),
            target: clean_target(caps.get(4).map_or("", |m| m.as_str())),
        })
    }

    fn target(&self) -> &str {
        match self {
            Directive::Keyed { target, .. } | Directive::Bare { target, .. } => target,
        }
    }

    /// Lines standing in for a target that is deliberately not spliced.
    fn placeholder(&self) -> Vec<String> {
        match self {
            Directive::Keyed { prefix, key, .. } => vec![format!("{prefix}{key}: {PLACEHOLDER}")],
            Directive::Bare { indent, dashed, .. } => {
                let dash = if *dashed { "- " } else { "" };
                vec![format!("{}{dash}{PLACEHOLDER}", " ".repeat(*indent))]
            }
        }
    }

    /// Splice already-expanded `content` at this directive's position.
    fn splice(&self, content: &str, structured: bool) -> Vec<String> {
        match self {
            Directive::Keyed { prefix, key_col, key, .. } => {
                let body = reindent(content, key_col + 2);
                if body.is_empty() {
                    return vec![format!("{prefix}{key}:")];
                }
                if !structured {
                    let mut lines = vec![format!("{prefix}{key}: |")];
                    lines.extend(body);
                    return lines;
                }
                if body.len() == 1 {
                    let single = body[0].trim();
                    if !single.starts_with("- ") && !SIMPLE_KEY.is_match(single) {
                        return vec![format!("{prefix}{key}: {single}")];
                    }
                }
                let mut lines = vec![format!("{prefix}{key}:")];
                lines.extend(body);
                lines
            }
            Directive::Bare { indent, dashed, .. } => {
                let col = if *dashed { indent + 2 } else { *indent };
                let mut body = reindent(content, col);
                if body.is_empty() {
                    return self.placeholder();
                }
                if *dashed {
                    body[0] = format!("{}- {}", " ".repeat(*indent), body[0].trim_start());
                }
                body
            }
        }
    }
}

/// Expands `!include` directives against a file set.
pub struct IncludeExpander<'a> {
    files: &'a FileSet,
    limits: Limits,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> IncludeExpander<'a> {
    /// Create an expander over `files`.
    pub fn new(files: &'a FileSet, limits: Limits, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            files,
            limits,
            diagnostics,
        }
    }

    /// Expand every include in `text`, which is the content of `origin`.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::IncludeNotFound` for a missing target that is
    /// not under a documentation directory.
    pub fn expand(&self, text: &str, origin: &str) -> Result<String, AssemblyError> {
        let mut current = text.to_string();
        for pass in 0..self.limits.include_passes {
            if !has_include(&current) {
                return Ok(current);
            }
            self.diagnostics
                .note(Stage::Include, format!("include pass {} over '{origin}'", pass + 1));
            let mut stack = vec![origin.to_string()];
            current = self.expand_pass(&current, origin, &mut stack)?;
        }
        if has_include(&current) {
            self.diagnostics.warning(
                Stage::Include,
                format!(
                    "include markers remain in '{origin}' after {} passes",
                    self.limits.include_passes
                ),
            );
        }
        Ok(current)
    }

    fn expand_pass(
        &self,
        text: &str,
        origin: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, AssemblyError> {
        let mut out: Vec<String> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            match Directive::parse(line) {
                Some(directive) => {
                    out.extend(self.render(&directive, origin, idx + 1, line, stack)?);
                }
                None => out.push(line.to_string()),
            }
        }
        let mut expanded = out.join("\n");
        if text.ends_with('\n') {
            expanded.push('\n');
        }
        Ok(expanded)
    }

    fn render(
        &self,
        directive: &Directive,
        origin: &str,
        line_no: usize,
        line: &str,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>, AssemblyError> {
        let target = directive.target();
        if is_documentation_path(&join_relative(origin, target)) {
            self.diagnostics.warning(
                Stage::Include,
                format!("skipping documentation include '{target}' from '{origin}'"),
            );
            return Ok(directive.placeholder());
        }

        let Some((path, raw)) = self.files.resolve(origin, target) else {
            return Err(AssemblyError::IncludeNotFound {
                target: target.to_string(),
                origin: origin.to_string(),
                line: line_no,
                text: line.trim().to_string(),
            });
        };

        if stack.contains(&path) {
            self.diagnostics.warning(
                Stage::Include,
                format!("cyclic include of '{path}' from '{origin}' replaced by placeholder"),
            );
            return Ok(directive.placeholder());
        }
        if stack.len() > self.limits.include_passes {
            self.diagnostics.warning(
                Stage::Include,
                format!("include depth bound reached at '{path}'; directive left in place"),
            );
            return Ok(vec![line.to_string()]);
        }

        let structured = is_structured(&path);
        let mut content = strip_header(&fix_indentation(raw));
        if structured {
            stack.push(path.clone());
            content = self.expand_pass(&content, &path, stack)?;
            stack.pop();
        }
        Ok(directive.splice(&content, structured))
    }
}

/// Returns true if any non-comment line of `text` holds an include directive.
pub fn has_include(text: &str) -> bool {
    text.lines().any(|line| Directive::parse(line).is_some())
}

/// Drop a leading `#%RAML` header line and the blank lines after it.
pub fn strip_header(text: &str) -> String {
    let mut lines = text.lines().peekable();
    match lines.peek() {
        Some(first) if first.trim_start().starts_with("#%RAML") => {
            lines.next();
            while lines.peek().is_some_and(|l| l.trim().is_empty()) {
                lines.next();
            }
            lines.collect::<Vec<_>>().join("\n")
        }
        _ => text.to_string(),
    }
}

/// Re-indent `content` so its least-indented line starts at `col`.
/// Leading and trailing blank lines are dropped; inner blank lines are kept empty.
pub fn reindent(content: &str, col: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return Vec::new();
    };
    let last = lines.iter().rposition(|l| !l.trim().is_empty()).unwrap_or(first);
    let slice = &lines[first..=last];
    let min_indent = slice
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    let pad = " ".repeat(col);
    slice
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{}", &l[min_indent..])
            }
        })
        .collect()
}

fn is_structured(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => STRUCTURED_EXTENSIONS.contains(&ext),
        None => true,
    }
}

fn clean_target(raw: &str) -> String {
    let without_comment = match raw.find(" #") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    without_comment
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ramlc_core::{CollectingDiagnostics, NoopDiagnostics};

    fn expand(files: &FileSet, entry: &str) -> Result<String, AssemblyError> {
        let expander = IncludeExpander::new(files, Limits::default(), &NoopDiagnostics);
        expander.expand(files.get(entry).unwrap_or_default(), entry)
    }

    #[test]
    fn text_without_includes_is_unchanged() {
        let text = "#%RAML 1.0\ntitle: T\n/users:\n  get:\n";
        let files = FileSet::new().with_file("api.raml", text);
        assert_eq!(expand(&files, "api.raml").unwrap(), text);
    }

    #[test]
    fn keyed_include_nests_content_under_key() {
        let files = FileSet::new()
            .with_file("api.raml", "types:\n  User: !include types/user.raml\n")
            .with_file(
                "types/user.raml",
                "#%RAML 1.0 DataType\n\ntype: object\nproperties:\n  name: string\n",
            );
        assert_eq!(
            expand(&files, "api.raml").unwrap(),
            "types:\n  User:\n    type: object\n    properties:\n      name: string\n"
        );
    }

    #[test]
    fn nested_includes_resolve_relative_to_included_file() {
        let files = FileSet::new()
            .with_file("api.raml", "types: !include types/index.raml\n")
            .with_file("types/index.raml", "User: !include user.raml\n")
            .with_file("types/user.raml", "type: object\n");
        assert_eq!(
            expand(&files, "api.raml").unwrap(),
            "types:\n  User:\n    type: object\n"
        );
    }

    #[test]
    fn dotdot_targets_are_normalized() {
        let files = FileSet::new()
            .with_file("api/main.raml", "traits:\n  paged: !include ../shared/paged.raml\n")
            .with_file("shared/paged.raml", "queryParameters:\n  page: integer\n");
        assert_eq!(
            expand(&files, "api/main.raml").unwrap(),
            "traits:\n  paged:\n    queryParameters:\n      page: integer\n"
        );
    }

    #[test]
    fn bare_sequence_include_keeps_dash() {
        let files = FileSet::new()
            .with_file("api.raml", "traits:\n  - !include paged.raml\n")
            .with_file("paged.raml", "paged:\n  description: pages\n");
        assert_eq!(
            expand(&files, "api.raml").unwrap(),
            "traits:\n  - paged:\n      description: pages\n"
        );
    }

    #[test]
    fn scalar_include_is_inlined() {
        let files = FileSet::new()
            .with_file("api.raml", "types:\n  Id: !include id.raml\n")
            .with_file("id.raml", "string\n");
        assert_eq!(expand(&files, "api.raml").unwrap(), "types:\n  Id: string\n");
    }

    #[test]
    fn documentation_include_becomes_placeholder() {
        let files = FileSet::new().with_file("api.raml", "description: !include docs/intro.md\n");
        let sink = CollectingDiagnostics::new();
        let expander = IncludeExpander::new(&files, Limits::default(), &sink);
        let out = expander.expand(files.get("api.raml").unwrap(), "api.raml").unwrap();
        assert_eq!(out, "description: \"\"\n");
        assert_eq!(sink.warnings(Stage::Include).len(), 1);
    }

    #[test]
    fn prose_include_becomes_block_scalar() {
        let files = FileSet::new()
            .with_file("api.raml", "description: !include notes/about.md\n")
            .with_file("notes/about.md", "# About\n\nkey: not yaml structure\n");
        let out = expand(&files, "api.raml").unwrap();
        assert_eq!(out, "description: |\n  # About\n\n  key: not yaml structure\n");
        let doc = ramlc_core::codec::parse_yaml(&out).unwrap();
        assert!(doc["description"].as_str().unwrap().starts_with("# About"));
    }

    #[test]
    fn missing_include_names_line_and_target() {
        let files = FileSet::new().with_file("api.raml", "title: T\ntypes:\n  User: !include nope.raml\n");
        match expand(&files, "api.raml").unwrap_err() {
            AssemblyError::IncludeNotFound { target, origin, line, .. } => {
                assert_eq!(target, "nope.raml");
                assert_eq!(origin, "api.raml");
                assert_eq!(line, 3);
            }
            other => panic!("expected IncludeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_include_terminates_with_placeholder() {
        let files = FileSet::new()
            .with_file("a.raml", "child: !include b.raml\n")
            .with_file("b.raml", "back: !include a.raml\n");
        let out = expand(&files, "a.raml").unwrap();
        assert_eq!(out, "child:\n  back: \"\"\n");
        assert!(!has_include(&out));
    }

    #[test]
    fn commented_include_is_ignored() {
        assert!(!has_include("# type: !include x.raml\n"));
        assert!(has_include("type: !include x.raml\n"));
    }

    #[test]
    fn reindent_preserves_relative_structure() {
        let lines = reindent("\n    a:\n      b: 1\n\n    c: 2\n\n", 2);
        assert_eq!(lines, vec!["  a:", "    b: 1", "", "  c: 2"]);
    }

    proptest! {
        /// Text without include directives passes through unchanged.
        #[test]
        fn expansion_without_includes_is_identity(
            lines in prop::collection::vec("( {2}){0,3}[a-z]{1,8}: [a-z0-9 ]{0,10}", 0..16)
        ) {
            let text = lines.join("\n");
            let files = FileSet::new().with_file("api.raml", text.clone());
            prop_assert_eq!(expand(&files, "api.raml").unwrap(), text);
        }
    }
}
