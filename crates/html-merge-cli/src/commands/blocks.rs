/*
 * blocks.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `html-merge blocks`: show how a template's conditionals are parsed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use html_merge::{ConditionalBlock, expand_array_shorthand, extract_conditionals};

use super::{VariableArgs, read_template, write_output};

#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Template file
    pub template: PathBuf,

    /// Variables used to mark each block as resolved or not
    #[command(flatten)]
    pub variables: VariableArgs,

    #[arg(long, default_value = "")]
    pub spacer: String,

    /// Write output to FILE (use '-' for stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the blocks command
pub fn execute(args: BlocksArgs) -> Result<()> {
    let raw = expand_array_shorthand(&read_template(&args.template)?);
    let variables = args.variables.load()?;

    let blocks = extract_conditionals(&raw, &variables, &args.spacer);
    let blocks: Vec<&ConditionalBlock> = blocks.values().collect();

    let mut json = serde_json::to_string_pretty(&blocks).context("Failed to encode blocks")?;
    json.push('\n');
    write_output(args.output.as_deref(), &json)
}
