//! # Text Normalizer
//!
//! Repairs raw RAML text before it reaches the YAML codec.
//!
//! 1. **Indentation.** Tabs are replaced by two spaces and odd leading
//!    indentation is rounded up to the next even column. Comment and blank
//!    lines pass through untouched.
//! 2. **Duplicate keys.** Within one nesting scope a repeated key (and the
//!    block nested under it) is commented out rather than deleted, so line
//!    numbers in later diagnostics still point at the source.
//!
//! Scopes are tracked per indentation level. A scope ends when indentation
//! drops back past it, when a new sequence item starts, or, for every level
//! but the top one, at a blank line.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use ramlc_core::{Diagnostics, Stage};
use regex::Regex;

/// A mapping-key line: indentation, optional `- ` sequence marker, key, colon.
static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^( *)(- +)?("[^"]+"|'[^']+'|[^\s#:\-\[\{"'][^:]*?)\s*:(?:\s+(.*))?$"#)
        .expect("key line regex")
});

/// Run both normalization passes.
pub fn normalize(text: &str, diagnostics: &dyn Diagnostics) -> String {
    comment_duplicate_keys(&fix_indentation(text), diagnostics)
}

/// Replace tabs and round odd indentation up to the next even column.
pub fn fix_indentation(text: &str) -> String {
    rebuild(text, text.lines().map(fix_line).collect())
}

fn fix_line(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return line.to_string();
    }
    let replaced = line.replace('\t', "  ");
    let content = replaced.trim_start_matches(' ');
    let mut indent = replaced.len() - content.len();
    if indent % 2 == 1 {
        indent += 1;
    }
    format!("{}{content}", " ".repeat(indent))
}

/// Comment out keys repeated within the same nesting scope, together with
/// the block nested under them.
pub fn comment_duplicate_keys(text: &str, diagnostics: &dyn Diagnostics) -> String {
    let mut scopes: BTreeMap<usize, HashSet<String>> = BTreeMap::new();
    let mut out: Vec<String> = Vec::new();
    let mut commenting_below: Option<usize> = None;
    let mut block_scalar_below: Option<usize> = None;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(threshold) = commenting_below {
            if trimmed.is_empty() {
                out.push(line.to_string());
                continue;
            }
            if indent > threshold {
                out.push(comment_out(line, indent));
                continue;
            }
            commenting_below = None;
        }

        if let Some(threshold) = block_scalar_below {
            if trimmed.is_empty() || indent > threshold {
                out.push(line.to_string());
                continue;
            }
            block_scalar_below = None;
        }

        if trimmed.is_empty() {
            scopes.retain(|&level, _| level == 0);
            out.push(line.to_string());
            continue;
        }
        if trimmed.starts_with('#') {
            out.push(line.to_string());
            continue;
        }

        let Some(caps) = KEY_LINE.captures(line) else {
            if trimmed.starts_with('-') {
                scopes.retain(|&level, _| level <= indent);
            }
            out.push(line.to_string());
            continue;
        };

        let dash_len = caps.get(2).map_or(0, |m| m.as_str().len());
        let key_indent = indent + dash_len;
        if dash_len > 0 {
            scopes.retain(|&level, _| level <= indent);
        } else {
            scopes.retain(|&level, _| level <= key_indent);
        }

        let key = unquote(caps.get(3).map_or("", |m| m.as_str()));
        let seen = scopes.entry(key_indent).or_default();
        if seen.contains(&key) {
            diagnostics.warning(
                Stage::Normalize,
                format!("duplicate key '{key}' at line {} commented out", idx + 1),
            );
            out.push(comment_out(line, indent));
            commenting_below = Some(key_indent);
            continue;
        }
        seen.insert(key);

        let value = caps.get(4).map_or("", |m| m.as_str()).trim();
        if value.starts_with('|') || value.starts_with('>') {
            block_scalar_below = Some(key_indent);
        }
        out.push(line.to_string());
    }

    rebuild(text, out)
}

fn comment_out(line: &str, indent: usize) -> String {
    format!("{}# {}", &line[..indent], &line[indent..])
}

fn unquote(key: &str) -> String {
    key.trim_matches(|c| c == '"' || c == '\'').to_string()
}

fn rebuild(original: &str, lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    if original.ends_with('\n') {
        text.push('\n');
    }
    text
}
