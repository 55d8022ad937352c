// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations for the secgrep binary.

pub mod add;
pub mod chat;
pub mod index;
pub mod query;

use anyhow::Result;
use secgrep::config::Config;
use secgrep::knowledge::{create_embedder, ChunkConfig, KnowledgeStore, TextChunker};

/// Builds an empty knowledge store from configuration.
///
/// Chunking and dimension problems surface here, before any network or
/// model work happens.
pub fn open_store(config: &Config) -> Result<KnowledgeStore> {
    let chunk_config = ChunkConfig::new(
        config.chunking.chunk_size(),
        config.chunking.chunk_overlap(),
    )?;
    let chunker = TextChunker::new(chunk_config);
    let embedder = create_embedder(&config.embeddings)?;
    KnowledgeStore::new(chunker, embedder)
}
