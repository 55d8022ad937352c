// SPDX-License-Identifier: MIT OR Apache-2.0

//! The knowledge store: owns the vector index and the chunk arena.
//!
//! Every mutation goes through this type, and the index and arena change
//! together or not at all. A chunk's arena slot number equals its vector
//! position in the index; that number is the only correlation key.
//!
//! Persistence is a single SQLite file holding one row per chunk (content,
//! metadata JSON, embedding blob) plus a meta table. A restore that finds
//! anything missing or inconsistent reports `false` and leaves the
//! in-memory state untouched.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::knowledge::chunker::TextChunker;
use crate::knowledge::document::{Document, DocumentMetadata};
use crate::knowledge::embedder::Embedder;
use crate::knowledge::index::FlatIndex;

/// File name of the persisted store inside the chosen directory.
pub const STORE_FILE: &str = "knowledge.sqlite";

const SCHEMA_VERSION: &str = "1";

/// One arena slot: the chunk text and its provenance.
#[derive(Debug, Clone)]
struct Entry {
    content: String,
    metadata: DocumentMetadata,
}

/// A retrieval hit, hydrated with content and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub relevance_score: f32,
}

/// Orchestrates chunking, embedding, indexing and persistence.
pub struct KnowledgeStore {
    chunker: TextChunker,
    embedder: Box<dyn Embedder>,
    index: FlatIndex,
    entries: Vec<Entry>,
}

impl KnowledgeStore {
    /// Creates an empty store.
    ///
    /// The index dimension comes from the embedder, so `append` is valid
    /// even before the first `build`.
    pub fn new(chunker: TextChunker, embedder: Box<dyn Embedder>) -> Result<Self> {
        let index = FlatIndex::new(embedder.dimension())?;
        Ok(Self {
            chunker,
            embedder,
            index,
            entries: Vec::new(),
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The embedding dimension this store was created with.
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Full rebuild from a document set; discards any prior state.
    ///
    /// Returns the number of chunks indexed. Prior state survives if any
    /// step fails.
    pub fn build(&mut self, documents: &[Document]) -> Result<usize> {
        let chunks = self.chunker.split(documents);
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();

        let vectors = self
            .embedder
            .encode(&texts)
            .context("Failed to embed chunk contents")?;

        let mut index = FlatIndex::new(self.dimension())?;
        index.add(&vectors)?;
        let entries: Vec<Entry> = chunks
            .into_iter()
            .map(|chunk| Entry {
                content: chunk.content,
                metadata: chunk.metadata,
            })
            .collect();

        debug_assert_eq!(entries.len(), index.len());
        debug!(chunks = entries.len(), "knowledge base built");

        self.index = index;
        self.entries = entries;
        Ok(self.entries.len())
    }

    /// Chunks and indexes one additional document.
    ///
    /// Existing positions are never replaced or reordered. Returns the
    /// number of chunks added.
    pub fn append(&mut self, content: &str, metadata: DocumentMetadata) -> Result<usize> {
        let pieces = self.chunker.split_text(content);
        if pieces.is_empty() {
            return Ok(0);
        }

        let vectors = self
            .embedder
            .encode(&pieces)
            .context("Failed to embed appended document")?;
        self.index.add(&vectors)?;
        let added = pieces.len();
        self.entries.extend(pieces.into_iter().map(|piece| Entry {
            content: piece,
            metadata: metadata.clone(),
        }));

        debug_assert_eq!(self.entries.len(), self.index.len());
        Ok(added)
    }

    /// Retrieves the `top_k` most relevant chunks for a query, best first.
    ///
    /// An unbuilt or empty store yields an empty list, never an error;
    /// callers treat that as the signal to answer without grounding.
    pub fn retrieve(&mut self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .encode_one(query)
            .context("Failed to embed query")?;
        let hits = self.index.search(&query_vector, top_k)?;

        Ok(hits
            .into_iter()
            .map(|(position, distance)| {
                let entry = &self.entries[position];
                RetrievedChunk {
                    content: entry.content.clone(),
                    metadata: entry.metadata.clone(),
                    relevance_score: similarity(distance),
                }
            })
            .collect())
    }

    /// Writes the index and arena to `dir` as one transaction.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        let path = dir.join(STORE_FILE);

        let mut conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            r#"
            DROP TABLE IF EXISTS chunks;
            DROP TABLE IF EXISTS meta;

            CREATE TABLE meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE chunks (
                position INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            "#,
        )
        .context("Failed to initialize store schema")?;

        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1), ('dimension', ?2), ('model', ?3)",
            params![
                SCHEMA_VERSION,
                self.dimension().to_string(),
                self.embedder.model_id()
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (position, content, metadata, embedding) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in self.entries.iter().enumerate() {
                let vector = self
                    .index
                    .vector(position)
                    .context("Arena and index positions out of step")?;
                let metadata_json = serde_json::to_string(&entry.metadata)?;
                stmt.execute(params![
                    position as i64,
                    entry.content,
                    metadata_json,
                    embedding_to_blob(vector)
                ])?;
            }
        }

        tx.commit()?;
        debug!(chunks = self.entries.len(), path = %path.display(), "knowledge store persisted");
        Ok(())
    }

    /// Loads previously persisted state from `dir`.
    ///
    /// Returns `Ok(false)` when nothing usable exists there: no file, a
    /// schema or row that fails to decode, a dimension or model that does
    /// not match this store's embedder, or positions out of sequence. The
    /// in-memory state is only replaced on a fully successful load.
    pub fn restore(&mut self, dir: impl AsRef<Path>) -> Result<bool> {
        let path = dir.as_ref().join(STORE_FILE);
        if !path.exists() {
            return Ok(false);
        }

        match self.load_snapshot(&path) {
            Ok((index, entries)) => {
                debug!(chunks = entries.len(), path = %path.display(), "knowledge store restored");
                self.index = index;
                self.entries = entries;
                Ok(true)
            }
            Err(err) => {
                warn!(
                    "Ignoring unusable knowledge store at {}: {:#}",
                    path.display(),
                    err
                );
                Ok(false)
            }
        }
    }

    fn load_snapshot(&self, path: &Path) -> Result<(FlatIndex, Vec<Entry>)> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let dimension: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'dimension'", [], |row| {
                row.get(0)
            })
            .context("Missing dimension metadata")?;
        let dimension: usize = dimension.parse().context("Invalid dimension metadata")?;
        if dimension != self.dimension() {
            bail!(
                "Stored dimension {} does not match embedder dimension {}",
                dimension,
                self.dimension()
            );
        }

        let model: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'model'", [], |row| {
                row.get(0)
            })
            .context("Missing model metadata")?;
        if model != self.embedder.model_id() {
            bail!(
                "Stored model '{}' does not match configured model '{}'",
                model,
                self.embedder.model_id()
            );
        }

        let mut stmt = conn.prepare(
            "SELECT position, content, metadata, embedding FROM chunks ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read chunk rows")?;

        let mut index = FlatIndex::new(dimension)?;
        let mut entries = Vec::with_capacity(rows.len());

        for (expected, (position, content, metadata_json, blob)) in rows.into_iter().enumerate() {
            if position != expected as i64 {
                bail!("Chunk positions are not contiguous at {}", position);
            }
            if blob.len() != dimension * 4 {
                bail!("Embedding blob at position {} has the wrong length", position);
            }
            let metadata: DocumentMetadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("Undecodable metadata at position {}", position))?;

            index.add(&[blob_to_embedding(&blob)])?;
            entries.push(Entry { content, metadata });
        }

        Ok((index, entries))
    }
}

/// Converts a squared-L2 distance into a relevance score in (0, 1].
fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Converts an embedding vector to a compact blob.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Converts a blob back to an embedding vector.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
