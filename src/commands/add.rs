// SPDX-License-Identifier: MIT OR Apache-2.0

//! `secgrep add` - append a custom document to the knowledge base.

use anyhow::{bail, Result};
use std::path::Path;

use secgrep::config::Config;
use secgrep::knowledge::DocumentMetadata;

pub fn run(
    text: Option<&str>,
    file: Option<&Path>,
    name: Option<&str>,
    asset_type: Option<&str>,
) -> Result<()> {
    let content = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => bail!("Provide document text or --file"),
    };
    if content.trim().is_empty() {
        bail!("Document is empty");
    }

    let config = Config::load();
    let store_dir = config.store.dir();

    let mut store = super::open_store(&config)?;
    // Appending to a store that was never built is fine; the index
    // dimension is fixed by the embedder, not by the first build.
    store.restore(&store_dir)?;

    let metadata = DocumentMetadata::Infrastructure {
        asset_name: name.unwrap_or("Custom note").to_string(),
        asset_type: asset_type.unwrap_or("note").to_string(),
    };

    let added = store.append(&content, metadata)?;
    store.persist(&store_dir)?;

    println!(
        "Added {} chunk(s); knowledge base now holds {} chunk(s).",
        added,
        store.len()
    );
    Ok(())
}
