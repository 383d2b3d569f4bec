/*
 * each.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `html-merge each`: render a template once per element of a collection.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use html_merge::Collection;
use tracing::info;

use super::{VariableArgs, read_json, read_template, write_output};

#[derive(Args, Debug)]
pub struct EachArgs {
    /// Template rendered for every element
    pub template: PathBuf,

    /// JSON file holding an array of objects or an object of objects
    #[arg(long, value_name = "FILE")]
    pub items: PathBuf,

    /// Global variables available to every element
    #[command(flatten)]
    pub variables: VariableArgs,

    /// Text placed between rendered elements
    #[arg(long, default_value = "")]
    pub spacer: String,

    /// Write output to FILE (use '-' for stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the each command
pub fn execute(args: EachArgs) -> Result<()> {
    let raw = read_template(&args.template)?;
    let items = read_json(&args.items)?;
    let Some(collection) = Collection::from_json(&items) else {
        anyhow::bail!(
            "Items must be a JSON array or object: {}",
            args.items.display()
        );
    };
    let globals = args.variables.load()?;

    info!(
        template = %args.template.display(),
        elements = collection.len(),
        "rendering collection"
    );
    let html = pollster::block_on(html_merge::render_collection(
        &raw,
        &collection,
        &globals,
        &args.spacer,
    ));

    write_output(args.output.as_deref(), &html)
}
