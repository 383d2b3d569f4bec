/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `html-merge render`: merge variables into a single template.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{VariableArgs, read_template, write_output};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,

    #[command(flatten)]
    pub variables: VariableArgs,

    /// Text placed around selected conditional branches and between array elements
    #[arg(long, default_value = "")]
    pub spacer: String,

    /// Write output to FILE (use '-' for stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let raw = read_template(&args.template)?;
    let variables = args.variables.load()?;

    info!(template = %args.template.display(), variables = variables.len(), "rendering");
    let html = html_merge::merge_blocking(&raw, &variables, &args.spacer);

    write_output(args.output.as_deref(), &html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_execute_writes_merged_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.html");
        let vars = dir.path().join("vars.json");
        let output = dir.path().join("out.html");
        std::fs::write(
            &template,
            "<title>{head.title}</title>{?:user}Hi {user}{:else:}Sign in{:?} ({[count]})",
        )
        .unwrap();
        std::fs::write(&vars, r#"{"head": {"title": "Menu"}, "count": 2.0}"#).unwrap();

        execute(RenderArgs {
            template,
            variables: VariableArgs {
                vars: Some(vars),
                set: vec!["user=Ann".to_string()],
                flatten: true,
            },
            spacer: String::new(),
            output: Some(output.clone()),
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "<title>Menu</title>Hi Ann (2)"
        );
    }

    #[test]
    fn test_execute_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(RenderArgs {
            template: dir.path().join("nope.html"),
            variables: VariableArgs {
                vars: None,
                set: vec![],
                flatten: false,
            },
            spacer: String::new(),
            output: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }
}
