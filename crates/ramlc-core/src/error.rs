//! # Error Types: Structured Error Hierarchy
//!
//! Defines the fatal error types used throughout the engine. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Assembly errors name the offending file, alias, and line.
//! - Codec errors carry a 1-based line number and a line-numbered excerpt
//!   of the text that failed to parse.
//! - Engine errors on the validate path enumerate what *is* available
//!   (paths, methods) so the caller can correct the request.
//!
//! Non-fatal, per-field validation failures are not errors in this sense:
//! they are accumulated as `FieldError` values in `ramlc-schema`.

use thiserror::Error;

/// Failure while assembling a multi-file RAML project into one text blob.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// The nominated entry file is not part of the file set.
    #[error("entry file '{0}' not found in file set")]
    EntryNotFound(String),

    /// An `!include` target could not be found and is not a documentation skip.
    #[error("include target '{target}' not found (included from '{origin}' line {line}: {text})")]
    IncludeNotFound {
        /// Path as written after `!include`.
        target: String,
        /// File containing the directive.
        origin: String,
        /// 1-based line number of the directive within `origin`.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// A `uses:` entry points at a file that is not in the file set.
    #[error("library '{alias}' not found at '{path}'")]
    LibraryNotFound {
        /// Alias declared in the `uses:` block.
        alias: String,
        /// Path declared for the alias.
        path: String,
    },

    /// A library file could not be parsed after include expansion.
    #[error("library '{alias}' ({path}) could not be parsed: {message}\n{excerpt}")]
    LibraryParse {
        /// Alias declared in the `uses:` block.
        alias: String,
        /// Resolved library path.
        path: String,
        /// Parser message.
        message: String,
        /// Line-numbered excerpt around the failure.
        excerpt: String,
    },

    /// A library imports itself in a way that cannot be stripped, or the
    /// library import chain exceeded its depth bound.
    #[error("circular library import for '{alias}' at '{path}'")]
    CircularLibrary {
        /// Alias declared in the `uses:` block.
        alias: String,
        /// Resolved library path.
        path: String,
    },
}

/// Failure while parsing YAML or JSON text into a document tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// The text is not valid YAML/JSON.
    #[error("parse error{}: {message}\n{excerpt}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Parse {
        /// Parser message.
        message: String,
        /// 1-based line of the failure, when the parser reports one.
        line: Option<usize>,
        /// Line-numbered excerpt around the failure.
        excerpt: String,
    },

    /// An `!include` tag survived assembly and reached the codec.
    #[error("unresolved !include directive for '{0}'")]
    UnresolvedInclude(String),

    /// The tree contains a value JSON cannot represent.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// The tree could not be serialized back to text.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// Failure on the compile path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Multi-file assembly failed.
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// The assembled document could not be parsed.
    #[error("document error: {0}")]
    Codec(#[from] CodecError),

    /// The parsed document violates a structural invariant of the mapper.
    #[error("mapping error: {0}")]
    Mapping(String),
}

/// Failure on the validate path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The nominated entry file is not part of the file set.
    #[error("entry file '{0}' not found in file set")]
    EntryNotFound(String),

    /// The entry document could not be parsed.
    #[error("document error: {0}")]
    Codec(#[from] CodecError),

    /// No declared path matches the requested path.
    #[error("path '{path}' not found; available paths: {}", .available.join(", "))]
    PathNotFound {
        /// Requested path (query string stripped).
        path: String,
        /// Declared path templates.
        available: Vec<String>,
    },

    /// The path exists but does not declare the requested method.
    #[error("method '{method}' not declared for '{path}'; available methods: {}", .available.join(", "))]
    MethodNotFound {
        /// Requested method, upper-cased.
        method: String,
        /// Matched path template.
        path: String,
        /// Methods declared on the path.
        available: Vec<String>,
    },

    /// A body-expecting method declares neither a request body nor parameters.
    #[error("no request body or parameters declared for {method} {path}")]
    NoRequestSchema {
        /// Requested method, upper-cased.
        method: String,
        /// Matched path template.
        path: String,
    },

    /// Response validation was requested but no 2xx response is declared.
    #[error("no success response declared for {method} {path}")]
    NoSuccessResponse {
        /// Requested method, upper-cased.
        method: String,
        /// Matched path template.
        path: String,
    },
}
