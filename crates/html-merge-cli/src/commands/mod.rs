/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the html-merge CLI.
//!
//! Each command module handles its arguments and delegates to the
//! `html-merge` library for the merge itself.

pub mod blocks;
pub mod each;
pub mod render;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use html_merge::{Value, Variables};
use tracing::debug;

/// Where a command's variables come from.
#[derive(Args, Debug)]
pub struct VariableArgs {
    /// JSON file holding an object of variables
    #[arg(long, value_name = "FILE")]
    pub vars: Option<PathBuf>,

    /// Set a variable (KEY=VALUE); VALUE is parsed as JSON when possible
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Flatten nested objects in the variables file into dotted keys
    #[arg(long)]
    pub flatten: bool,
}

impl VariableArgs {
    /// Build the variable mapping: the file first, then `--set` overrides in
    /// command-line order.
    pub fn load(&self) -> Result<Variables> {
        let mut variables = match &self.vars {
            Some(path) => {
                let json = read_json(path)?;
                let loaded = if self.flatten {
                    Variables::from_json_flattened(json)
                } else {
                    Variables::from_json(json)
                };
                loaded.with_context(|| format!("Invalid variables file: {}", path.display()))?
            }
            None => Variables::new(),
        };

        for assignment in &self.set {
            let (key, value) = parse_assignment(assignment)?;
            variables.insert(key, value);
        }

        debug!(count = variables.len(), "variables loaded");
        Ok(variables)
    }
}

/// Parse a `KEY=VALUE` assignment.
///
/// VALUE is read as JSON if it parses (`3`, `true`, `[1,2]`), otherwise it is
/// taken as a plain string.
pub fn parse_assignment(text: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = text.split_once('=') else {
        anyhow::bail!("Expected KEY=VALUE, got: {}", text);
    };
    if key.is_empty() {
        anyhow::bail!("Empty key in assignment: {}", text);
    }

    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw));
    Ok((key.to_string(), value))
}

pub fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Write `text` to `output`, or to stdout when no path (or `-`) is given.
pub fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) if path != Path::new("-") => std::fs::write(path, text)
            .with_context(|| format!("Failed to write output: {}", path.display())),
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
