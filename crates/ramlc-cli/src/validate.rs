//! # Validate Subcommand
//!
//! Validates a request or response payload against an OpenAPI document in a
//! project directory and prints the outcome as JSON.
//!
//! ```bash
//! ramlc validate ./openapi --method POST --path /users --payload '{"name": "Ada"}'
//! ramlc validate ./openapi --method GET --path '/orders?id=3' --header 'X-Request-Id: abc'
//! ramlc validate ./openapi --method GET --path /status --direction response --payload-file status.json
//! ```
//!
//! Exit code 0 means valid, 1 means invalid or failed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ramlc_core::{EngineConfig, TracingDiagnostics};
use ramlc_schema::{select_entry_file, Direction, PayloadValidator, ValidationRequest};
use serde_json::Value;

use crate::project::load_directory;

/// Which side of the exchange the payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Request,
    Response,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Request => Direction::Request,
            DirectionArg::Response => Direction::Response,
        }
    }
}

/// Arguments for `ramlc validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project directory holding the OpenAPI document.
    pub dir: PathBuf,

    /// Entry document. Defaults to the shallowest openapi/swagger/api file.
    #[arg(long)]
    pub entry: Option<String>,

    /// Request path, optionally with a query string.
    #[arg(long)]
    pub path: String,

    /// HTTP method.
    #[arg(long)]
    pub method: String,

    #[arg(long, value_enum, default_value_t = DirectionArg::Request)]
    pub direction: DirectionArg,

    /// Inline JSON payload.
    #[arg(long, conflicts_with = "payload_file")]
    pub payload: Option<String>,

    /// File holding the JSON payload.
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// Request header as `Name: value`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

/// Execute `ramlc validate`.
pub fn run_validate(args: &ValidateArgs, config: &EngineConfig) -> Result<u8> {
    let files = load_directory(&args.dir)?;
    let entry = match &args.entry {
        Some(entry) => entry.clone(),
        None => select_entry_file(&files).with_context(|| {
            format!("no openapi/swagger/api document found in {}", args.dir.display())
        })?,
    };

    let mut request = ValidationRequest::new(&args.method, &args.path)
        .with_direction(args.direction.into())
        .with_payload(read_payload(args)?);
    for (name, value) in &args.headers {
        request = request.with_header(name, value);
    }

    let outcome = PayloadValidator::new(config.clone(), &TracingDiagnostics)
        .validate(&files, &entry, &request)
        .with_context(|| format!("failed to validate {} {} against {entry}", args.method, args.path))?;
    tracing::info!(entry = %entry, valid = outcome.valid, errors = outcome.errors.len(), "validated");

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(if outcome.valid { 0 } else { 1 })
}

fn read_payload(args: &ValidateArgs) -> Result<Value> {
    let text = match (&args.payload, &args.payload_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload file: {}", path.display()))?,
        (None, None) => return Ok(Value::Null),
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

/// Parse `Name: value` (or `Name:value`).
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected 'Name: value', got '{raw}'")),
    }
}
