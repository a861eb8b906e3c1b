//! # Validate Subcommand
//!
//! Validates a data document against a schema the way a form submission is
//! validated: merged with the form defaults first, issues mapped into a
//! nested error tree. Exits 0 when valid and 2 when the submission has
//! errors.
//!
//! ```bash
//! formset validate signup.schema.json submission.json
//! formset validate signup.schema.yaml submission.yaml --flat
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formset_core::flatten_errors;
use formset_schema::{load_document, EngineConfig, FormSchema, FormValidation};
use serde_json::json;

use crate::{render, OutputFormat};

/// Exit code for a submission that failed validation.
pub const EXIT_INVALID: u8 = 2;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file.
    pub schema: PathBuf,

    /// Data document to validate.
    pub data: PathBuf,

    /// Print one `path: message` line per error instead of the result document.
    #[arg(long)]
    pub flat: bool,

    /// Output format for the result document.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &EngineConfig) -> Result<u8> {
    let form = FormSchema::from_file(&args.schema, config.clone())
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;
    let data = load_document(&args.data)
        .with_context(|| format!("failed to load data {}", args.data.display()))?;

    let result = form.validate(&data);
    tracing::info!(valid = result.valid, issues = result.issues.len(), "validated submission");

    let text = if args.flat {
        render_flat(&result)
    } else {
        render_result(&result, args.format)?
    };
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(if result.valid { 0 } else { EXIT_INVALID })
}

/// The result as `{valid, data, errors}`.
pub fn render_result(result: &FormValidation, format: OutputFormat) -> Result<String> {
    let document = json!({
        "valid": result.valid,
        "data": result.data.to_json(),
        "errors": result.errors.to_json(),
    });
    render(&document, format)
}

/// One line per message; form-level messages are prefixed with `(form)`.
pub fn render_flat(result: &FormValidation) -> String {
    let mut lines = Vec::new();
    for entry in flatten_errors(&result.errors) {
        let owner = if entry.path.is_empty() { "(form)" } else { entry.path.as_str() };
        for message in &entry.messages {
            lines.push(format!("{owner}: {message}"));
        }
    }
    lines.join("\n")
}
