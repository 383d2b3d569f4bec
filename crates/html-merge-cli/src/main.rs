/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * html-merge CLI - Main entry point
 */

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "html-merge")]
#[command(version, about = "Merge variables into marker-based HTML templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge variables into a template
    Render(commands::render::RenderArgs),

    /// Render a template once per element of a JSON array or object
    Each(commands::each::EachArgs),

    /// Print the conditional blocks found in a template as JSON
    Blocks(commands::blocks::BlocksArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "html_merge=debug"
    } else {
        "html_merge=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::execute(args),
        Commands::Each(args) => commands::each::execute(args),
        Commands::Blocks(args) => commands::blocks::execute(args),
    }
}
