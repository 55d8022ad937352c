// SPDX-License-Identifier: MIT OR Apache-2.0

//! secgrep - Local semantic security knowledge search tool
//!
//! Builds a local vector store over vulnerability records and
//! infrastructure descriptions, answers queries against it, and grounds
//! AI-generated answers in the retrieved chunks.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with SECGREP_LOG env var (e.g., SECGREP_LOG=debug secgrep query "...")
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SECGREP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Index {
            days,
            limit,
            assets,
            offline,
            force,
        } => {
            commands::index::run(days, limit, assets.as_deref(), offline, force)?;
        }
        Commands::Query {
            query,
            top_k,
            quiet,
        } => {
            commands::query::run(&query, top_k, quiet, format)?;
        }
        Commands::Chat {
            question,
            no_context,
            top_k,
        } => {
            commands::chat::run(question.as_deref(), no_context, top_k)?;
        }
        Commands::Add {
            text,
            file,
            name,
            asset_type,
        } => {
            commands::add::run(
                text.as_deref(),
                file.as_deref(),
                name.as_deref(),
                asset_type.as_deref(),
            )?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "secgrep", &mut std::io::stdout());
        }
    }

    Ok(())
}
