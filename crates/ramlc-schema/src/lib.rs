//! # ramlc-schema: Payload Validation Against OpenAPI Documents
//!
//! Validates a JSON payload (and its query, path and header parameters)
//! against the operation an OpenAPI 3 document declares for a concrete
//! request path and method.
//!
//! ## Modules
//!
//! - [`refs`]: internal and external `$ref` resolution, bulk inlining.
//! - [`validate`]: type-directed schema validation.
//! - [`params`]: parameter lookup and string coercion.
//! - [`payload`]: path matching and request/response orchestration.
//! - [`outcome`]: request, field error and outcome types.
//!
//! ## Entry Points
//!
//! [`validate`] uses the default configuration and reports soft failures
//! through `tracing`. [`PayloadValidator`] takes an explicit
//! [`EngineConfig`] and diagnostics sink.

pub mod outcome;
pub mod params;
pub mod payload;
pub mod refs;
pub mod validate;

use ramlc_core::codec::parse_document;
use ramlc_core::{Diagnostics, EngineConfig, EngineError, FileSet, TracingDiagnostics};

pub use outcome::{Direction, FieldError, ValidationOutcome, ValidationRequest};
pub use refs::{Located, RefResolver};
pub use validate::SchemaValidator;

/// File names accepted as the entry document, in preference order.
pub const ENTRY_FILE_NAMES: [&str; 9] = [
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "swagger.yaml",
    "swagger.yml",
    "swagger.json",
    "api.yaml",
    "api.yml",
    "api.json",
];

/// Pick the entry document of a file set: the shallowest file whose name
/// is in [`ENTRY_FILE_NAMES`], ties broken by that list's order.
pub fn select_entry_file(files: &FileSet) -> Option<String> {
    files
        .paths()
        .filter_map(|path| {
            let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
            let rank = ENTRY_FILE_NAMES.iter().position(|candidate| *candidate == name)?;
            Some((path.matches('/').count(), rank, path))
        })
        .min()
        .map(|(_, _, path)| path.to_string())
}

/// Validates payloads with an explicit configuration.
pub struct PayloadValidator<'a> {
    config: EngineConfig,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> PayloadValidator<'a> {
    pub fn new(config: EngineConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    /// Validate `request` against the document at `entry`.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` or `Codec` if the entry document is missing or
    /// unparseable, otherwise the orchestration errors of
    /// [`payload::validate_document`].
    pub fn validate(
        &self,
        files: &FileSet,
        entry: &str,
        request: &ValidationRequest,
    ) -> Result<ValidationOutcome, EngineError> {
        let text = files
            .get(entry)
            .ok_or_else(|| EngineError::EntryNotFound(entry.to_string()))?;
        let document = parse_document(entry, text)?;
        payload::validate_document(files, entry, &document, request, &self.config, self.diagnostics)
    }
}

/// Validate `request` against the document at `entry` with defaults.
///
/// # Errors
///
/// See [`PayloadValidator::validate`].
pub fn validate(
    files: &FileSet,
    entry: &str,
    request: &ValidationRequest,
) -> Result<ValidationOutcome, EngineError> {
    PayloadValidator::new(EngineConfig::default(), &TracingDiagnostics).validate(files, entry, request)
}
