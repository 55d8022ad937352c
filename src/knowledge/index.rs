// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact nearest-neighbor index over squared Euclidean distance.
//!
//! Vectors live flattened in a single `Vec<f32>`; the row number is the
//! entry's position and the only key other components use to refer to it.
//! Search scans every entry. Corpora here are hundreds to low thousands of
//! chunks, so an exact scan beats the complexity of an approximate index.

use rayon::prelude::*;

use crate::errors::ConfigError;

/// Brute-force flat vector index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::DimensionZero);
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    /// Returns the vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends vectors in order; each receives the next sequential position.
    ///
    /// Existing entries are never reordered or removed. If any vector has
    /// the wrong dimension, nothing from the call is applied.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), ConfigError> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(ConfigError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Returns the stored vector at `position`, if present.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        let end = start + self.dimension;
        self.data.get(start..end)
    }

    /// Finds the `k` nearest entries to `query` by squared Euclidean
    /// distance, closest first, ties broken by lower position.
    ///
    /// Returns at most `min(k, len)` results; `k == 0` or an empty index
    /// yields an empty vec.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, ConfigError> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(ConfigError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .par_chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, squared_l2(query, row)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
