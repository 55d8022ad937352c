// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge module - the retrieval core
//!
//! Raw records become documents (normalizer), documents become overlapping
//! chunks (chunker), chunks become vectors (embedder), vectors go into an
//! exact nearest-neighbor index, and the knowledge store keeps the index
//! and the chunk arena moving in lockstep across build, retrieve, append,
//! persist and restore.

pub mod chunker;
pub mod document;
pub mod embedder;
pub mod index;
pub mod normalizer;
pub mod store;

pub use chunker::{ChunkConfig, TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use document::{Document, DocumentMetadata};
pub use embedder::{create_embedder, Embedder, FastEmbedder, HashEmbedder, DEFAULT_EMBEDDING_DIM};
pub use index::FlatIndex;
pub use normalizer::{normalize_all, normalize_infrastructure, normalize_vulnerability};
pub use store::{KnowledgeStore, RetrievedChunk, STORE_FILE};
