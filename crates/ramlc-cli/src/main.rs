//! # ramlc CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ramlc_cli::compile::{run_compile, run_flatten, CompileArgs, FlattenArgs};
use ramlc_cli::project::load_config;
use ramlc_cli::validate::{run_validate, ValidateArgs};

/// RAML to OpenAPI compiler and OpenAPI payload validator.
#[derive(Parser, Debug)]
#[command(name = "ramlc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to an engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a RAML project into an OpenAPI document.
    Compile(CompileArgs),

    /// Resolve a RAML or OpenAPI project into one self-contained file.
    Flatten(FlattenArgs),

    /// Validate a payload against an OpenAPI document.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Compile(args) => run_compile(args, &config),
        Commands::Flatten(args) => run_flatten(args, &config),
        Commands::Validate(args) => run_validate(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_compile() {
        let cli = Cli::try_parse_from(["ramlc", "compile", "api", "--entry", "api.raml", "--format", "json"])
            .unwrap();
        match cli.command {
            Commands::Compile(args) => {
                assert_eq!(args.dir, PathBuf::from("api"));
                assert_eq!(args.entry, "api.raml");
                assert_eq!(args.format, ramlc_cli::compile::OutputFormat::Json);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_validate_with_headers() {
        let cli = Cli::try_parse_from([
            "ramlc",
            "-vv",
            "validate",
            "api",
            "--method",
            "GET",
            "--path",
            "/orders?id=3",
            "--header",
            "X-Id: 1",
            "--header",
            "X-Trace: t",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.headers.len(), 2);
                assert_eq!(args.headers[0], ("X-Id".to_string(), "1".to_string()));
                assert!(args.entry.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn payload_and_payload_file_conflict() {
        let result = Cli::try_parse_from([
            "ramlc", "validate", "api", "--method", "POST", "--path", "/u", "--payload", "{}",
            "--payload-file", "p.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_option_is_global() {
        let cli = Cli::try_parse_from(["ramlc", "flatten", "api", "--entry", "a.raml", "--config", "ramlc.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ramlc.yaml")));
    }

    #[test]
    fn missing_subcommand_errors() {
        assert!(Cli::try_parse_from(["ramlc"]).is_err());
    }
}
