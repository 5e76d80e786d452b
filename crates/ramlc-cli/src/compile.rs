//! # Compile and Flatten Subcommands
//!
//! ```bash
//! # Compile a RAML project to OpenAPI YAML on stdout:
//! ramlc compile ./api --entry api.raml
//!
//! # Compile to a JSON file:
//! ramlc compile ./api --entry api.raml --format json --output openapi.json
//!
//! # Resolve includes, libraries and traits into one RAML file:
//! ramlc flatten ./api --entry api.raml
//!
//! # Inline every $ref of a split OpenAPI document:
//! ramlc flatten ./openapi --entry openapi.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ramlc_convert::Compiler;
use ramlc_core::{EngineConfig, TracingDiagnostics};

use crate::project::load_directory;

/// Serialization of the compiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Arguments for `ramlc compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Project directory.
    pub dir: PathBuf,

    /// Root RAML file, relative to the project directory.
    #[arg(long)]
    pub entry: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for `ramlc flatten`.
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Project directory.
    pub dir: PathBuf,

    /// Root RAML or OpenAPI file, relative to the project directory.
    #[arg(long)]
    pub entry: String,

    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute `ramlc compile`.
pub fn run_compile(args: &CompileArgs, config: &EngineConfig) -> Result<u8> {
    let files = load_directory(&args.dir)?;
    let document = Compiler::new(config.clone(), &TracingDiagnostics)
        .compile(&files, &args.entry)
        .with_context(|| format!("failed to compile {}", args.entry))?;
    tracing::info!(
        entry = %args.entry,
        paths = document.paths.len(),
        schemas = document.components.schemas.len(),
        "compiled"
    );
    let text = match args.format {
        OutputFormat::Yaml => document.to_yaml()?,
        OutputFormat::Json => document.to_json()?,
    };
    emit(&text, args.output.as_deref())?;
    Ok(0)
}

/// Execute `ramlc flatten`.
pub fn run_flatten(args: &FlattenArgs, config: &EngineConfig) -> Result<u8> {
    let files = load_directory(&args.dir)?;
    let text = Compiler::new(config.clone(), &TracingDiagnostics)
        .flatten(&files, &args.entry)
        .with_context(|| format!("failed to flatten {}", args.entry))?;
    emit(&text, args.output.as_deref())?;
    Ok(0)
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "written");
        }
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
