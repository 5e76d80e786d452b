//! # ramlc-convert: RAML to OpenAPI Compilation
//!
//! Compiles a multi-file RAML project into a single OpenAPI 3 document:
//!
//! ```text
//! FileSet ──▶ ramlc_raml::load_document ──▶ mapper::map_document ──▶ OpenApiDocument
//!            (includes, libraries,          (paths, operations,
//!             types, traits)                 schemas, security)
//! ```
//!
//! [`flatten`] stops before the structural step for RAML input and emits
//! the resolved RAML text. For OpenAPI input it inlines every `$ref` and
//! re-emits the document in its source format.
//!
//! ## Modules
//!
//! - [`model`]: typed OpenAPI document model.
//! - [`mapper`]: resource walk, operations, parameters, bodies.
//! - [`datatype`]: RAML type declarations → schema objects.
//! - [`security`]: security schemes and `securedBy` requirements.
//! - [`defaults`]: default policies for omitted fields.

pub mod datatype;
pub mod defaults;
pub mod mapper;
pub mod model;
pub mod security;

use ramlc_core::codec::{is_json_path, parse_document, to_json_pretty, to_yaml};
use ramlc_core::{
    AssemblyError, CompileError, Diagnostics, EngineConfig, FileSet, Stage, TracingDiagnostics,
};
use ramlc_schema::RefResolver;

pub use datatype::TypeConverter;
pub use mapper::map_document;
pub use model::OpenApiDocument;

/// Header line of flattened RAML output.
const RAML_HEADER: &str = "#%RAML 1.0";

/// Compiles and flattens with an explicit configuration.
pub struct Compiler<'a> {
    config: EngineConfig,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Compiler<'a> {
    pub fn new(config: EngineConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    /// Compile the RAML project rooted at `entry` into an OpenAPI document.
    ///
    /// # Errors
    ///
    /// Any assembly, parse or mapping failure.
    pub fn compile(&self, files: &FileSet, entry: &str) -> Result<OpenApiDocument, CompileError> {
        let document = ramlc_raml::load_document(files, entry, &self.config, self.diagnostics)?;
        self.diagnostics.note(
            Stage::Mapping,
            format!("{entry}: resolved with {} libraries", document.libraries.len()),
        );
        map_document(&document.tree, &self.config, self.diagnostics)
    }

    /// Resolve `entry` to a single self-contained text.
    ///
    /// RAML entries are assembled and resolved, then re-emitted as RAML.
    /// OpenAPI entries get every `$ref` inlined; `.json` entries are emitted
    /// as pretty JSON, others as YAML.
    ///
    /// # Errors
    ///
    /// `Assembly(EntryNotFound)` if `entry` is absent, otherwise any
    /// assembly, parse or serialization failure.
    pub fn flatten(&self, files: &FileSet, entry: &str) -> Result<String, CompileError> {
        let text = files
            .get(entry)
            .ok_or_else(|| AssemblyError::EntryNotFound(entry.to_string()))?;

        if is_raml(entry, text) {
            let document = ramlc_raml::load_document(files, entry, &self.config, self.diagnostics)?;
            let body = to_yaml(&document.tree)?;
            return Ok(format!("{RAML_HEADER}\n{body}"));
        }

        let root = parse_document(entry, text)?;
        let resolver = RefResolver::new(files, entry, &root, self.diagnostics);
        let inlined = resolver.inline_all(&root, entry);
        let out = if is_json_path(entry) {
            to_json_pretty(&inlined)?
        } else {
            to_yaml(&inlined)?
        };
        Ok(out)
    }
}

fn is_raml(path: &str, text: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".raml") || text.trim_start().starts_with("#%RAML")
}

/// Compile with the default configuration, reporting through `tracing`.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(files: &FileSet, entry: &str) -> Result<OpenApiDocument, CompileError> {
    Compiler::new(EngineConfig::default(), &TracingDiagnostics).compile(files, entry)
}

/// Flatten with the default configuration, reporting through `tracing`.
///
/// # Errors
///
/// See [`Compiler::flatten`].
pub fn flatten(files: &FileSet, entry: &str) -> Result<String, CompileError> {
    Compiler::new(EngineConfig::default(), &TracingDiagnostics).flatten(files, entry)
}
