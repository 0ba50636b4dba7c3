//! JSON output helpers.
//!
//! Every `--json` code path prints one pretty-printed document on stdout:
//! the command's output type on success, or the error object on failure.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use studentbox_common::{EnvsOutput, ListOutput, StatusOutput};

use crate::domain::RuntimeCatalogue;

/// Format the JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Print `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Renders command results as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_list(&self, list: &ListOutput) -> Result<()> {
        print(list)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_status(&self, status: &StatusOutput) -> Result<()> {
        print(status)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_envs(&self, envs: &EnvsOutput) -> Result<()> {
        print(envs)
    }

    /// `{"<runtime>": {"ports": [...], "images": {"<short>": "<reference>"}}}`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_runtimes(&self, catalogue: &RuntimeCatalogue) -> Result<()> {
        let view: BTreeMap<&str, serde_json::Value> = catalogue
            .iter()
            .map(|rt| {
                let images: BTreeMap<&str, &str> = rt
                    .images
                    .values()
                    .map(|img| (img.short_name.as_str(), img.reference.as_str()))
                    .collect();
                (
                    rt.name.as_str(),
                    serde_json::json!({ "ports": rt.ports, "images": images }),
                )
            })
            .collect();
        print(&view)
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        print(&serde_json::json!({ "version": version }))
    }
}
