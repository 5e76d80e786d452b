//! # ramlc-cli: Command-Line Interface for the RAML/OpenAPI Engine
//!
//! Provides the `ramlc` binary over a project directory.
//!
//! ## Subcommands
//!
//! - `ramlc compile`: RAML project to OpenAPI YAML or JSON.
//! - `ramlc flatten`: single-file RAML, or an OpenAPI document with every
//!   `$ref` inlined.
//! - `ramlc validate`: payload and parameter validation against an OpenAPI
//!   document, outcome printed as JSON.
//!
//! Handlers load the directory into a `FileSet` and delegate to the library
//! crates. Each returns the process exit code.

pub mod compile;
pub mod project;
pub mod validate;
