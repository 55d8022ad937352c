// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for secgrep
//!
//! Loads configuration from .secgreprc.toml in the current directory or
//! ~/.config/secgrep/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    Fastembed,
    Hash,
}

/// Text generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    #[default]
    Ollama,
    Openai,
}

/// Chunking configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    pub chunk_size: Option<usize>,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: Option<usize>,
}

impl ChunkingConfig {
    /// Get chunk size (defaults to 800)
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(800)
    }

    /// Get chunk overlap (defaults to 100)
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap.unwrap_or(100)
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (fastembed, hash)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the fastembed provider
    pub model: Option<String>,
    /// Embedding batch size
    pub batch_size: Option<usize>,
    /// Maximum characters fed to the embedder per text
    pub max_chars: Option<usize>,
    /// Whether to L2-normalize embeddings
    pub normalize: Option<bool>,
    /// Vector dimension for the hash provider
    pub dimension: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Fastembed)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get model identifier (defaults to "minilm")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("minilm")
    }

    /// Get batch size (defaults to 512)
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(512)
    }

    /// Get max chars per text (defaults to 2000)
    pub fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(2000)
    }

    /// Get normalization flag (defaults to true)
    pub fn normalize(&self) -> bool {
        self.normalize.unwrap_or(true)
    }

    /// Get hash provider dimension (defaults to 384)
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(384)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: Option<usize>,
}

impl RetrievalConfig {
    /// Get top k (defaults to 5)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(5)
    }
}

/// Vulnerability feed configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Registry endpoint
    pub base_url: Option<String>,
    /// API key (falls back to the NVD_API_KEY environment variable)
    pub api_key: Option<String>,
    /// How many days back to fetch
    pub days: Option<u32>,
    /// Maximum number of records to fetch
    pub max_results: Option<usize>,
    /// Cache file for fetched records
    pub cache_file: Option<PathBuf>,
}

impl FeedConfig {
    /// Get registry endpoint (defaults to the NVD 2.0 API)
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://services.nvd.nist.gov/rest/json/cves/2.0")
    }

    /// Get API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("NVD_API_KEY").ok())
    }

    /// Get lookback window in days (defaults to 30)
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(30)
    }

    /// Get max results (defaults to 100)
    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(100)
    }

    /// Get cache file path (defaults to data/cve_data.json)
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("data").join("cve_data.json"))
    }
}

/// Text generator configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Backend (ollama, openai)
    pub backend: Option<GeneratorBackend>,
    /// Model name
    pub model: Option<String>,
    /// Endpoint base URL
    pub base_url: Option<String>,
    /// API key (falls back to the OPENAI_API_KEY environment variable)
    pub api_key: Option<String>,
    /// Maximum tokens in a response
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl GeneratorConfig {
    /// Get backend (defaults to Ollama)
    pub fn backend(&self) -> GeneratorBackend {
        self.backend.unwrap_or_default()
    }

    /// Get model name (backend-dependent default)
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.backend() {
            GeneratorBackend::Ollama => "gemma3",
            GeneratorBackend::Openai => "gpt-3.5-turbo",
        })
    }

    /// Get endpoint base URL (backend-dependent default)
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(match self.backend() {
            GeneratorBackend::Ollama => "http://localhost:11434",
            GeneratorBackend::Openai => "https://api.openai.com",
        })
    }

    /// Get API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Get max tokens (defaults to 1000)
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(1000)
    }

    /// Get temperature (defaults to 0.3; factual answers want it low)
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.3)
    }
}

/// Knowledge store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the persisted store
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Get store directory (defaults to .secgrep)
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from(".secgrep"))
    }
}

/// Configuration loaded from .secgreprc.toml or ~/.config/secgrep/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Feed configuration
    #[serde(default)]
    pub feed: FeedConfig,

    /// Generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .secgreprc.toml in current directory
    /// 2. ~/.config/secgrep/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".secgreprc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("secgrep").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size(), 800);
        assert_eq!(config.chunking.chunk_overlap(), 100);
        assert_eq!(config.embeddings.provider(), EmbeddingProviderType::Fastembed);
        assert_eq!(config.embeddings.model(), "minilm");
        assert_eq!(config.retrieval.top_k(), 5);
        assert_eq!(config.generator.backend(), GeneratorBackend::Ollama);
        assert_eq!(config.generator.model(), "gemma3");
        assert_eq!(config.store.dir(), PathBuf::from(".secgrep"));
        assert!(config.feed.base_url().contains("nvd.nist.gov"));
    }

    #[test]
    fn test_parse_sections() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            chunk_size = 400
            chunk_overlap = 50

            [embeddings]
            provider = "hash"
            dimension = 128

            [retrieval]
            top_k = 3

            [generator]
            backend = "openai"
            model = "gpt-4o-mini"

            [store]
            dir = "cache/knowledge"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size(), 400);
        assert_eq!(config.chunking.chunk_overlap(), 50);
        assert_eq!(config.embeddings.provider(), EmbeddingProviderType::Hash);
        assert_eq!(config.embeddings.dimension(), 128);
        assert_eq!(config.retrieval.top_k(), 3);
        assert_eq!(config.generator.backend(), GeneratorBackend::Openai);
        assert_eq!(config.generator.model(), "gpt-4o-mini");
        assert_eq!(config.store.dir(), PathBuf::from("cache/knowledge"));
    }

    #[test]
    fn test_openai_backend_default_model() {
        let config: Config = toml::from_str("[generator]\nbackend = \"openai\"\n").unwrap();
        assert_eq!(config.generator.model(), "gpt-3.5-turbo");
        assert!(config.generator.base_url().contains("api.openai.com"));
    }
}
