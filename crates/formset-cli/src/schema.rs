//! # Schema Subcommands
//!
//! `defaults`, `constraints`, `shape` and `digest`: each reads one schema
//! file and prints a derived artifact.
//!
//! ```bash
//! formset defaults signup.schema.json
//! formset --config formset.yaml defaults signup.schema.yaml --format yaml
//! formset constraints signup.schema.json
//! formset digest signup.schema.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formset_core::Path;
use formset_schema::{cache_key, constraints, error_shape, EngineConfig, Schema, Synthesizer};
use serde_json::Value;

use crate::{read_schema, render, OutputFormat};

/// Arguments shared by the schema subcommands.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file (`.yaml`/`.yml` is read as YAML, anything else as JSON).
    pub schema: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Arguments for the defaults subcommand.
#[derive(Args, Debug)]
pub struct DefaultsArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Treat the form root as optional.
    #[arg(long)]
    pub optional: bool,
}

/// Print the synthesized default value.
pub fn run_defaults(args: &DefaultsArgs, config: &EngineConfig) -> Result<u8> {
    let (_, schema) = read_schema(&args.schema.schema)?;
    println!("{}", render_defaults(&schema, args.optional, config, args.schema.format)?);
    Ok(0)
}

/// Print the derived input constraints.
pub fn run_constraints(args: &SchemaArgs) -> Result<u8> {
    let (_, schema) = read_schema(&args.schema)?;
    println!("{}", render_constraints(&schema, args.format)?);
    Ok(0)
}

/// Print the error shape.
pub fn run_shape(args: &SchemaArgs) -> Result<u8> {
    let (_, schema) = read_schema(&args.schema)?;
    println!("{}", render_shape(&schema, args.format)?);
    Ok(0)
}

/// Print the content digest.
pub fn run_digest(args: &SchemaArgs, config: &EngineConfig) -> Result<u8> {
    let (document, _) = read_schema(&args.schema)?;
    println!("{}", render_digest(&document, config)?);
    Ok(0)
}

pub fn render_defaults(
    schema: &Schema,
    optional: bool,
    config: &EngineConfig,
    format: OutputFormat,
) -> Result<String> {
    let value = Synthesizer::new(config.clone())
        .default_value(schema, optional, &Path::root())
        .context("cannot synthesize defaults")?;
    render(&value.to_json(), format)
}

pub fn render_constraints(schema: &Schema, format: OutputFormat) -> Result<String> {
    let derived = constraints(schema, false, &Path::root()).context("cannot derive constraints")?;
    let value = match derived {
        Some(c) => serde_json::to_value(c)?,
        None => Value::Object(serde_json::Map::new()),
    };
    render(&value, format)
}

pub fn render_shape(schema: &Schema, format: OutputFormat) -> Result<String> {
    let shape = error_shape(schema).context("cannot derive error shape")?;
    render(&serde_json::to_value(shape)?, format)
}

pub fn render_digest(document: &Value, config: &EngineConfig) -> Result<String> {
    Ok(cache_key(document, config)?.to_string())
}
