//! # ramlc-raml: RAML Front End
//!
//! Turns a multi-file RAML project into one resolved document tree, ready
//! for structural mapping.
//!
//! ## Pipeline
//!
//! 1. [`normalize`]: tab and odd-indent repair, duplicate-key commenting.
//! 2. [`include`]: recursive `!include` expansion.
//! 3. [`library`]: `uses:` loading and `alias.Name` type substitution.
//! 4. Parse the assembled text with the shared codec.
//! 5. [`types`]: type-to-type expansion over the document's `types:`.
//! 6. [`traits`]: `is:` application across the resource tree.
//!
//! Stages 1–3 are textual and produce an [`Assembly`]; [`resolve_document`]
//! runs stages 4–6.

pub mod include;
pub mod library;
pub mod normalize;
pub mod traits;
pub mod tree;
pub mod types;

use ramlc_core::codec::parse_yaml;
use ramlc_core::{
    AssemblyError, CompileError, Diagnostics, EngineConfig, FileSet, Limits, Stage,
    TracingDiagnostics,
};
use serde_json::Value;

pub use library::Library;
pub use traits::{resolve_traits, TraitTable};
pub use types::{expand_fragment, expand_local_types, merge_fragments};

/// An assembled project: one text blob plus the libraries it imported.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Normalized text with every include spliced and library types substituted.
    pub text: String,
    /// Libraries from the entry file's `uses:` block.
    pub libraries: Vec<Library>,
}

/// A parsed RAML document with types expanded and traits applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RamlDocument {
    /// The resolved tree.
    pub tree: Value,
    /// Libraries from the entry file's `uses:` block.
    pub libraries: Vec<Library>,
}

/// Runs the textual stages over a file set.
pub struct Assembler<'a> {
    files: &'a FileSet,
    limits: Limits,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Assembler<'a> {
    pub fn new(files: &'a FileSet, limits: Limits, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            files,
            limits,
            diagnostics,
        }
    }

    /// Assemble `entry` into one text blob.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` if `entry` is not in the file set, otherwise the first
    /// include or library failure.
    pub fn assemble(&self, entry: &str) -> Result<Assembly, AssemblyError> {
        let raw = self
            .files
            .get(entry)
            .ok_or_else(|| AssemblyError::EntryNotFound(entry.to_string()))?;

        let text = normalize::fix_indentation(raw);
        let text = include::IncludeExpander::new(self.files, self.limits, self.diagnostics)
            .expand(&text, entry)?;
        let (text, libraries) =
            library::LibraryResolver::new(self.files, self.limits, self.diagnostics)
                .resolve(&text, entry)?;
        let text = normalize::normalize(&text, self.diagnostics);

        self.diagnostics.note(
            Stage::Library,
            format!("assembled '{entry}' with {} libraries", libraries.len()),
        );
        Ok(Assembly { text, libraries })
    }
}

/// Assemble `entry` with default limits, reporting through `tracing`.
///
/// # Errors
///
/// See [`Assembler::assemble`].
pub fn assemble(files: &FileSet, entry: &str) -> Result<String, AssemblyError> {
    Assembler::new(files, Limits::default(), &TracingDiagnostics)
        .assemble(entry)
        .map(|assembly| assembly.text)
}

/// Parse an assembly and run type expansion and trait resolution.
///
/// # Errors
///
/// `CompileError::Codec` if the text does not parse, and
/// `CompileError::Mapping` if the root is not a mapping.
pub fn resolve_document(
    assembly: Assembly,
    config: &EngineConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<RamlDocument, CompileError> {
    let mut tree = parse_yaml(&assembly.text)?;
    let Some(root) = tree.as_object_mut() else {
        return Err(CompileError::Mapping(
            "RAML document root must be a mapping".to_string(),
        ));
    };

    if let Some(types) = root.get("types").map(tree::named_map) {
        let expanded = expand_local_types(&types, config.limits.type_depth);
        diagnostics.note(Stage::Types, format!("expanded {} document types", expanded.len()));
        root.insert("types".to_string(), Value::Object(expanded));
    }

    resolve_traits(&mut tree, &assembly.libraries, diagnostics);
    Ok(RamlDocument {
        tree,
        libraries: assembly.libraries,
    })
}

/// Assemble and resolve `entry` in one step.
///
/// # Errors
///
/// Any assembly, parse or mapping failure.
pub fn load_document(
    files: &FileSet,
    entry: &str,
    config: &EngineConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<RamlDocument, CompileError> {
    let assembly = Assembler::new(files, config.limits, diagnostics).assemble(entry)?;
    resolve_document(assembly, config, diagnostics)
}
