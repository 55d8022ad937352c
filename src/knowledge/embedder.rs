// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The fastembed-based provider is the default. The hash provider maps
//! token occurrences into signed buckets; it needs no model download and is
//! deterministic, which makes it the offline and test provider.

use anyhow::{bail, Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::EmbeddingConfig;
use crate::errors::ConfigError;

/// Embedding dimension for sentence-transformers/all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const DEFAULT_BATCH_SIZE: usize = 512;
const MAX_BATCH_SIZE: usize = 1024;
const DEFAULT_MAX_CHARS: usize = 2000;

/// Trait for embedding providers.
///
/// The dimension is fixed at construction time, so an index sized from the
/// embedder is valid before any document has been encoded.
pub trait Embedder: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the fixed output dimension.
    fn dimension(&self) -> usize;

    /// Generates embeddings for the given texts, one vector per text.
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text (queries).
    fn encode_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.encode(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

/// Builds the provider selected by configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider() {
        crate::config::EmbeddingProviderType::Fastembed => {
            Ok(Box::new(FastEmbedder::new(config)?))
        }
        crate::config::EmbeddingProviderType::Hash => {
            Ok(Box::new(HashEmbedder::new(config.dimension())?))
        }
    }
}

/// FastEmbed provider using sentence-transformers/all-MiniLM-L6-v2.
pub struct FastEmbedder {
    embedder: TextEmbedding,
    model_id: String,
    dimension: usize,
    batch_size: usize,
    max_chars: usize,
    normalize: bool,
}

impl FastEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model, dimension) = resolve_model(config.model())?;
        let model_id = model.to_string();
        let init = InitOptions::new(model);
        let embedder =
            TextEmbedding::try_new(init).context("Failed to initialize fastembed model")?;

        let batch_size = config.batch_size().clamp(1, MAX_BATCH_SIZE);

        Ok(Self {
            embedder,
            model_id,
            dimension,
            batch_size,
            max_chars: config.max_chars().max(1),
            normalize: config.normalize(),
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = truncate_texts(texts, self.max_chars);
        let mut embeddings = self.embedder.embed(&prepared, Some(self.batch_size))?;

        for embedding in &embeddings {
            if embedding.len() != self.dimension {
                return Err(ConfigError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                }
                .into());
            }
        }

        if self.normalize {
            for embedding in embeddings.iter_mut() {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

/// Deterministic feature-hashing provider (offline/test).
///
/// Each lowercased alphanumeric token is hashed into one of `dimension`
/// signed buckets; the resulting vector is L2-normalized. Identical text
/// always produces the identical vector.
#[derive(Debug)]
pub struct HashEmbedder {
    model_id: String,
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::DimensionZero);
        }
        Ok(Self {
            model_id: "hash".to_string(),
            dimension,
        })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();

        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let digest = hasher.finish();

            let bucket = (digest % self.dimension as u64) as usize;
            let sign = if digest & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.trim().to_lowercase().as_str() {
        "" | "minilm" | "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, DEFAULT_EMBEDDING_DIM))
        }
        other => bail!("Unsupported embedding model '{}'. Supported value: minilm", other),
    }
}

fn truncate_texts<'a>(texts: &'a [String], max_chars: usize) -> Vec<Cow<'a, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars(input: &str, max_chars: usize) -> Cow<'_, str> {
    let mut count = 0;
    for (idx, _) in input.char_indices() {
        if count == max_chars {
            return Cow::Owned(input[..idx].to_string());
        }
        count += 1;
    }
    Cow::Borrowed(input)
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_rejects_zero_dimension() {
        assert_eq!(HashEmbedder::new(0).unwrap_err(), ConfigError::DimensionZero);
    }

    #[test]
    fn test_hash_embedder_dimension_and_count() {
        let mut provider = HashEmbedder::new(64).unwrap();
        let result = provider
            .encode(&["apache web server".to_string(), "postgres".to_string()])
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.len() == 64));
    }

    #[test]
    fn test_hash_embedder_deterministic() {
        let mut provider = HashEmbedder::new(128).unwrap();
        let a = provider.encode_one("sql injection in product x").unwrap();
        let b = provider.encode_one("sql injection in product x").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_embedder_distinguishes_texts() {
        let mut provider = HashEmbedder::new(128).unwrap();
        let a = provider.encode_one("apache httpd overflow").unwrap();
        let b = provider.encode_one("kernel privilege escalation").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_embedder_unit_norm() {
        let mut provider = HashEmbedder::new(32).unwrap();
        let vector = provider.encode_one("firewall vpn router switch").unwrap();
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hash_embedder_empty_text_is_zero_vector() {
        let mut provider = HashEmbedder::new(16).unwrap();
        let vector = provider.encode_one("").unwrap();
        assert!(vector.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_encode() {
        let mut provider = HashEmbedder::new(16).unwrap();
        assert!(provider.encode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncate_to_chars() {
        assert_eq!(
            truncate_to_chars("hello", 2),
            Cow::<str>::Owned("he".to_string())
        );
        assert_eq!(truncate_to_chars("hello", 5), Cow::Borrowed("hello"));
    }
}
