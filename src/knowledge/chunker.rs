// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text chunker for embedding generation.
//!
//! Splits document content into overlapping character windows. Splitting is
//! by character count only, never by token or sentence boundary, and never
//! inside a UTF-8 sequence.

use crate::errors::ConfigError;
use crate::knowledge::document::Document;

/// Default number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Configuration for the text chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum number of characters per chunk.
    pub chunk_size: usize,
    /// Number of characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// Creates a new ChunkConfig, rejecting invalid size/overlap pairs.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ChunkSizeZero);
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::ChunkOverlap {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    /// Creates a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Creates a chunker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Splits documents into chunks, each carrying a verbatim copy of its
    /// parent's metadata. Chunk order follows document order.
    pub fn split(&self, documents: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();
        for doc in documents {
            for piece in self.split_text(&doc.content) {
                chunks.push(Document::new(piece, doc.metadata.clone()));
            }
        }
        chunks
    }

    /// Splits text into overlapping character windows.
    ///
    /// Window starts advance by `chunk_size - chunk_overlap` characters, so
    /// adjacent windows share exactly `chunk_overlap` characters. Text no
    /// longer than `chunk_size` yields a single chunk equal to the input;
    /// empty text yields no chunks.
    pub fn split_text(&self, content: &str) -> Vec<String> {
        let boundaries: Vec<usize> = content.char_indices().map(|(idx, _)| idx).collect();
        let total = boundaries.len();

        if total == 0 {
            return Vec::new();
        }
        if total <= self.config.chunk_size {
            return vec![content.to_string()];
        }

        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0_usize;

        loop {
            let end = (start + self.config.chunk_size).min(total);
            let byte_start = boundaries[start];
            let byte_end = if end == total {
                content.len()
            } else {
                boundaries[end]
            };
            chunks.push(content[byte_start..byte_end].to_string());

            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }
}
