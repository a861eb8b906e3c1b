//! # formset CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads the
//! engine configuration and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formset_cli::diff::{run_diff, DiffArgs};
use formset_cli::load_config;
use formset_cli::schema::{run_constraints, run_defaults, run_digest, run_shape, DefaultsArgs, SchemaArgs};
use formset_cli::validate::{run_validate, ValidateArgs};

/// Formset: schema-driven form toolkit.
///
/// Synthesizes default values, input constraints and error shapes from JSON
/// Schema documents, validates submissions, and diffs form data.
#[derive(Parser, Debug)]
#[command(name = "formset", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the synthesized default value of a schema.
    Defaults(DefaultsArgs),

    /// Print the input constraints derived from a schema.
    Constraints(SchemaArgs),

    /// Print the error shape of a schema.
    Shape(SchemaArgs),

    /// Validate a data document against a schema.
    Validate(ValidateArgs),

    /// List the paths at which two data documents differ.
    Diff(DiffArgs),

    /// Print the content digest of a schema under the active configuration.
    Digest(SchemaArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Defaults(args) => run_defaults(args, &config),
        Commands::Constraints(args) => run_constraints(args),
        Commands::Shape(args) => run_shape(args),
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Diff(args) => run_diff(args),
        Commands::Digest(args) => run_digest(args, &config),
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
    use formset_cli::OutputFormat;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["formset", "defaults", "form.json", "--optional"]).unwrap();
        if let Commands::Defaults(args) = cli.command {
            assert_eq!(args.schema.schema, PathBuf::from("form.json"));
            assert!(args.optional);
            assert_eq!(args.schema.format, OutputFormat::Json);
        } else {
            panic!("expected defaults");
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "formset",
            "constraints",
            "form.yaml",
            "--format",
            "yaml",
            "-vv",
            "--config",
            "formset.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("formset.yaml")));
        if let Commands::Constraints(args) = cli.command {
            assert_eq!(args.format, OutputFormat::Yaml);
        } else {
            panic!("expected constraints");
        }
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::try_parse_from(["formset", "validate", "form.json", "data.json", "--flat"]).unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.schema, PathBuf::from("form.json"));
            assert_eq!(args.data, PathBuf::from("data.json"));
            assert!(args.flat);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn test_cli_parse_diff_requires_two_files() {
        assert!(Cli::try_parse_from(["formset", "diff", "a.json"]).is_err());
        let cli = Cli::try_parse_from(["formset", "diff", "a.json", "b.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Diff(_)));
    }

    #[test]
    fn test_cli_parse_shape_and_digest() {
        assert!(matches!(
            Cli::try_parse_from(["formset", "shape", "form.json"]).unwrap().command,
            Commands::Shape(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["formset", "digest", "form.json"]).unwrap().command,
            Commands::Digest(_)
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["formset", "shape", "form.json", "--format", "toml"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
