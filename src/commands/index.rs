// SPDX-License-Identifier: MIT OR Apache-2.0

//! `secgrep index` - build the knowledge base and persist it.

use anyhow::Result;
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use secgrep::config::Config;
use secgrep::feed::records::{
    load_assets, load_records, sample_infrastructure, save_records, VulnerabilityRecord,
};
use secgrep::feed::FeedClient;
use secgrep::knowledge::normalize_all;
use secgrep::output::use_colors;

pub fn run(
    days: Option<u32>,
    limit: Option<usize>,
    assets_path: Option<&Path>,
    offline: bool,
    force: bool,
) -> Result<()> {
    let config = Config::load();
    let use_color = use_colors();

    let records = collect_records(&config, days, limit, offline, force)?;
    if records.is_empty() {
        eprintln!("No vulnerability records available; indexing infrastructure only.");
    }

    let assets = match assets_path {
        Some(path) => load_assets(path)?,
        None => sample_infrastructure(),
    };

    let documents = normalize_all(&records, &assets);

    let mut store = super::open_store(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Embedding {} documents...", documents.len()));
    pb.enable_steady_tick(Duration::from_millis(100));
    let chunks = store.build(&documents)?;
    pb.finish_and_clear();

    let store_dir = config.store.dir();
    store.persist(&store_dir)?;

    let summary = format!(
        "Indexed {} records and {} assets ({} chunks) into {}",
        records.len(),
        assets.len(),
        chunks,
        store_dir.display()
    );
    if use_color {
        println!("{}", summary.green());
    } else {
        println!("{}", summary);
    }

    Ok(())
}

/// Loads records from the cache or the feed, preferring the cache unless
/// `--force` asks for a refetch. A feed failure degrades to the cache.
fn collect_records(
    config: &Config,
    days: Option<u32>,
    limit: Option<usize>,
    offline: bool,
    force: bool,
) -> Result<Vec<VulnerabilityRecord>> {
    let cache = config.feed.cache_file();

    if offline {
        return if cache.exists() {
            load_records(&cache)
        } else {
            eprintln!(
                "Offline and no record cache at {}; skipping vulnerability records.",
                cache.display()
            );
            Ok(Vec::new())
        };
    }

    if cache.exists() && !force {
        return load_records(&cache);
    }

    let days = days.unwrap_or(config.feed.days());
    let limit = limit.unwrap_or(config.feed.max_results());

    let client = FeedClient::new(&config.feed)?;
    match client.fetch_recent(days, limit) {
        Ok(records) => {
            save_records(&cache, &records)?;
            Ok(records)
        }
        Err(err) => {
            warn!("Vulnerability feed unavailable: {:#}", err);
            if cache.exists() {
                eprintln!("Feed unavailable; using cached records.");
                load_records(&cache)
            } else {
                eprintln!("Feed unavailable and no cache present.");
                Ok(Vec::new())
            }
        }
    }
}
