// SPDX-License-Identifier: MIT OR Apache-2.0

//! `secgrep query` - retrieve relevant knowledge chunks for a query.

use anyhow::Result;

use crate::cli::OutputFormat;
use secgrep::config::Config;
use secgrep::knowledge::{DocumentMetadata, RetrievedChunk};
use secgrep::output::{
    colorize_dim, colorize_id, colorize_score, colorize_severity, colorize_source, use_colors,
};

/// Longest content preview printed per result.
const PREVIEW_CHARS: usize = 240;

pub fn run(query: &str, top_k: Option<usize>, quiet: bool, format: OutputFormat) -> Result<()> {
    let config = Config::load();
    let mut store = super::open_store(&config)?;

    if !store.restore(config.store.dir())? {
        eprintln!(
            "No knowledge base found in {}; run `secgrep index` first.",
            config.store.dir().display()
        );
    }

    let top_k = top_k.unwrap_or(config.retrieval.top_k());
    let results = store.retrieve(query, top_k)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Text => {
            print_text(&results, quiet);
        }
    }

    Ok(())
}

fn print_text(results: &[RetrievedChunk], quiet: bool) {
    let use_color = use_colors();

    if results.is_empty() {
        println!("No results.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        let header = match &result.metadata {
            DocumentMetadata::Vulnerability {
                record_id,
                severity,
                score,
                ..
            } => format!(
                "{}. [{}] {} {} (CVSS {})",
                rank + 1,
                colorize_source("vulnerability", use_color),
                colorize_id(record_id, use_color),
                colorize_severity(severity, use_color),
                score
            ),
            DocumentMetadata::Infrastructure {
                asset_name,
                asset_type,
            } => format!(
                "{}. [{}] {} ({})",
                rank + 1,
                colorize_source("infrastructure", use_color),
                colorize_id(asset_name, use_color),
                asset_type
            ),
        };

        println!(
            "{}  relevance {}",
            header,
            colorize_score(result.relevance_score, use_color)
        );
        println!(
            "   {}",
            colorize_dim(&preview(&result.content), use_color)
        );
    }

    if !quiet {
        println!("\n{} result(s)", results.len());
    }
}

fn preview(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out: String = flattened.chars().take(PREVIEW_CHARS).collect();
    if flattened.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        let content = "line one\nline two\n".repeat(40);
        let preview = preview(&content);
        assert!(!preview.contains('\n'));
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_preview_short_content_untouched() {
        assert_eq!(preview("apache 2.4.52"), "apache 2.4.52");
    }
}
