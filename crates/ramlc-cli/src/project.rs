//! # Project Loading
//!
//! Reads a project directory into a [`FileSet`] and the optional engine
//! configuration file.
//!
//! Keys are paths relative to the project root with `/` separators. Files
//! that are not valid UTF-8 are skipped, as are hidden entries (`.git`,
//! `.DS_Store`).

use std::path::Path;

use anyhow::{Context, Result};
use ramlc_core::{EngineConfig, FileSet};
use walkdir::{DirEntry, WalkDir};

/// Load every UTF-8 file under `root`.
pub fn load_directory(root: &Path) -> Result<FileSet> {
    if !root.is_dir() {
        anyhow::bail!("project directory not found: {}", root.display());
    }
    let mut files = FileSet::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), root.display()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        match String::from_utf8(bytes) {
            Ok(text) => files.insert(&key, text),
            Err(_) => tracing::debug!(file = %key, "skipping non-UTF-8 file"),
        }
    }
    tracing::info!(root = %root.display(), files = files.len(), "loaded project");
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Engine configuration from `path`, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    EngineConfig::from_yaml_str(&text).with_context(|| format!("invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_nested_files_with_slash_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("types/common")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("api.raml"), "#%RAML 1.0\ntitle: T\n").unwrap();
        std::fs::write(dir.path().join("types/common/id.raml"), "type: string\n").unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: main\n").unwrap();
        std::fs::write(dir.path().join("logo.png"), b"\x89PNG\xff\xfe").unwrap();

        let files = load_directory(dir.path()).unwrap();
        let paths: Vec<&str> = files.paths().collect();
        assert_eq!(paths, ["api.raml", "types/common/id.raml"]);
        assert_eq!(files.get("types/common/id.raml"), Some("type: string\n"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_directory(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn config_defaults_and_file() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramlc.yaml");
        std::fs::write(&path, "openapi_version: 3.0.1\nlimits:\n  validation_depth: 20\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.openapi_version, "3.0.1");
        assert_eq!(config.limits.validation_depth, 20);
        assert_eq!(config.limits.include_passes, 10);
    }
}
