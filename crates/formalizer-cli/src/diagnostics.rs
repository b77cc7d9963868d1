//! Output formatting shared across subcommands.
//!
//! Splits output into the two shapes this harness needs: a plain-text
//! line and a `serde_json::json!` document.

use anyhow::Result;

/// Print a structured error, respecting `--format`.
pub fn report_error(format: &str, message: &str) -> Result<()> {
    if format == "json" {
        let doc = serde_json::json!({ "error": message });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        eprintln!("error: {message}");
    }
    Ok(())
}

/// Print a `serde_json::Value` document (json format) or fall back to a
/// caller-supplied text renderer.
pub fn emit(format: &str, doc: serde_json::Value, text: impl FnOnce()) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        text();
    }
    Ok(())
}
