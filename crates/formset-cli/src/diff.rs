//! # Diff Subcommand
//!
//! Prints the leaf paths at which two data documents differ, one per line,
//! in discovery order. Exits 0 when the documents are equal and 1 when they
//! differ, like `diff(1)`.
//!
//! ```bash
//! formset diff snapshot.json current.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formset_core::{diff, Value};
use formset_schema::load_document;

/// Arguments for the diff subcommand.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Baseline document.
    pub before: PathBuf,

    /// Document to compare against the baseline.
    pub after: PathBuf,
}

/// Execute the diff subcommand.
pub fn run_diff(args: &DiffArgs) -> Result<u8> {
    let before = load_document(&args.before)
        .with_context(|| format!("failed to load {}", args.before.display()))?;
    let after = load_document(&args.after)
        .with_context(|| format!("failed to load {}", args.after.display()))?;

    let lines = render_diff(&Value::from(before), &Value::from(after));
    for line in &lines {
        println!("{line}");
    }
    Ok(u8::from(!lines.is_empty()))
}

/// Changed paths in display form; the root is shown as `(root)`.
pub fn render_diff(before: &Value, after: &Value) -> Vec<String> {
    diff(before, after)
        .iter()
        .map(|path| {
            if path.is_empty() {
                "(root)".to_string()
            } else {
                path.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removed_array_item() {
        let a = Value::from(json!({"tags": ["a", "b"]}));
        let b = Value::from(json!({"tags": ["a"]}));
        assert_eq!(render_diff(&a, &b), vec!["tags[1]".to_string()]);
    }

    #[test]
    fn test_identical_documents() {
        let a = Value::from(json!({"x": {"y": [1, 2]}}));
        assert!(render_diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_root_scalars_are_compared() {
        let a = Value::from(json!("draft"));
        let b = Value::from(json!("final"));
        assert_eq!(render_diff(&a, &b), vec!["(root)".to_string()]);
        assert!(render_diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_run_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let before = dir.path().join("before.json");
        let after = dir.path().join("after.yaml");
        std::fs::write(&before, r#"{"name": "Ada"}"#).unwrap();
        std::fs::write(&after, "name: Ada\n").unwrap();
        let args = DiffArgs {
            before: before.clone(),
            after: after.clone(),
        };
        assert_eq!(run_diff(&args).unwrap(), 0);

        std::fs::write(&after, "name: Grace\n").unwrap();
        assert_eq!(run_diff(&args).unwrap(), 1);

        std::fs::write(&before, r#""x""#).unwrap();
        std::fs::write(&after, "y\n").unwrap();
        assert_eq!(run_diff(&args).unwrap(), 1);
    }
}
