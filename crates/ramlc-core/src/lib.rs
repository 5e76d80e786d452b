//! # ramlc-core: Foundational Types for the RAML Engine
//!
//! Every other crate in the workspace depends on `ramlc-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! - [`fileset`]: the immutable `FileSet` input and path normalization.
//! - [`codec`]: YAML/JSON text ↔ `serde_json::Value` tree conversion.
//! - [`diagnostics`]: the injectable sink for soft failures.
//! - [`limits`] / [`config`]: recursion bounds and engine configuration.
//! - [`error`]: the fatal error taxonomy (`AssemblyError`, `CompileError`,
//!   `EngineError`).
//!
//! ## Crate Policy
//!
//! - No process-wide mutable state. Every call is a pure function of its inputs.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fileset;
pub mod limits;

pub use config::EngineConfig;
pub use diagnostics::{
    CollectingDiagnostics, Diagnostic, Diagnostics, NoopDiagnostics, Severity, Stage,
    TracingDiagnostics,
};
pub use error::{AssemblyError, CodecError, CompileError, EngineError};
pub use fileset::FileSet;
pub use limits::Limits;
