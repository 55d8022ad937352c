// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed errors for setup-time configuration failures.
//!
//! These are the fatal errors of the retrieval core: bad chunking parameters
//! and embedding-dimension disagreements. Everything transient (feed or
//! generator HTTP failures) stays in `anyhow` at the command layer.

use thiserror::Error;

/// Configuration errors raised at construction or first use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk_overlap ({overlap}) must be less than chunk_size ({size})")]
    ChunkOverlap { size: usize, overlap: usize },

    #[error("chunk_size must be greater than 0")]
    ChunkSizeZero,

    #[error("embedding dimension must be greater than 0")]
    DimensionZero,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
