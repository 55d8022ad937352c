// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// secgrep - Local semantic security knowledge search
///
/// Indexes vulnerability records and infrastructure descriptions into a
/// local vector store, retrieves the most relevant chunks for a query, and
/// optionally grounds an AI-generated answer in them.
#[derive(Parser, Debug)]
#[command(name = "secgrep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the knowledge base from the vulnerability feed and asset descriptions
    #[command(alias = "i")]
    Index {
        /// How many days of records to fetch
        #[arg(long)]
        days: Option<u32>,

        /// Maximum number of records to fetch
        #[arg(short = 'm', long = "limit", visible_alias = "max-results")]
        limit: Option<usize>,

        /// JSON file of infrastructure assets (defaults to built-in samples)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Use only the on-disk record cache, never the network
        #[arg(long)]
        offline: bool,

        /// Refetch records even if a cache exists
        #[arg(long)]
        force: bool,
    },

    /// Retrieve the most relevant knowledge chunks for a query
    #[command(alias = "q")]
    Query {
        /// Search query (natural language)
        query: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Suppress the summary line
        #[arg(short = 'q', long)]
        quiet: bool,
    },

    /// Chat with the security assistant, grounding answers in the knowledge base
    Chat {
        /// Ask a single question and exit (omit for an interactive session)
        question: Option<String>,

        /// Answer without retrieving context
        #[arg(long)]
        no_context: bool,

        /// Number of chunks to ground each answer in
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Add a custom document to the knowledge base
    Add {
        /// Document text (or use --file)
        text: Option<String>,

        /// Read document text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Asset name recorded in metadata
        #[arg(long)]
        name: Option<String>,

        /// Asset type recorded in metadata
        #[arg(long = "type")]
        asset_type: Option<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
