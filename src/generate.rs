// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text generation backends.
//!
//! The retrieval core hands a generator a single prompt string and gets a
//! single answer string back; nothing else about the backend is observed.
//! Two backends are supported: a local Ollama endpoint and an
//! OpenAI-compatible chat-completions endpoint.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{GeneratorBackend, GeneratorConfig};

/// Generation can sit behind a cold local model; give it a long leash.
const GENERATE_TIMEOUT_SECONDS: u64 = 600;

const SYSTEM_PROMPT: &str =
    "You are a cybersecurity expert assistant. Provide accurate, actionable security advice.";

/// A collaborator that turns a prompt into an answer.
pub trait TextGenerator {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Generates a response for the prompt.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Builds the generator selected by configuration.
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn TextGenerator>> {
    match config.backend() {
        GeneratorBackend::Ollama => Ok(Box::new(OllamaGenerator::new(config)?)),
        GeneratorBackend::Openai => Ok(Box::new(OpenAiGenerator::new(config)?)),
    }
}

fn http_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(GENERATE_TIMEOUT_SECONDS)))
        .build()
        .into()
}

/// Local Ollama backend (`/api/generate`, non-streaming).
pub struct OllamaGenerator {
    url: Url,
    model: String,
    temperature: f32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let base = Url::parse(config.base_url())
            .with_context(|| format!("Invalid generator URL: {}", config.base_url()))?;
        let url = base
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        Ok(Self {
            url,
            model: config.model().to_string(),
            temperature: config.temperature(),
            agent: http_agent(),
        })
    }
}

impl TextGenerator for OllamaGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generate request")?;

        debug!("POST {} (model {})", self.url, self.model);

        let body = self
            .agent
            .post(self.url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Ollama request failed (is `ollama serve` running?)")?;

        let parsed: OllamaResponse =
            serde_json::from_str(&body).context("Failed to parse Ollama response")?;
        Ok(parsed.response.trim().to_string())
    }
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiGenerator {
    url: Url,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

impl OpenAiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let Some(api_key) = config.api_key() else {
            bail!("No API key configured for the openai generator backend");
        };

        let base = Url::parse(config.base_url())
            .with_context(|| format!("Invalid generator URL: {}", config.base_url()))?;
        let url = base
            .join("/v1/chat/completions")
            .context("Failed to build chat completions URL")?;

        Ok(Self {
            url,
            model: config.model().to_string(),
            api_key,
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
            agent: http_agent(),
        })
    }
}

impl TextGenerator for OpenAiGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        debug!("POST {} (model {})", self.url, self.model);

        let body = self
            .agent
            .post(self.url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Chat completions request failed")?;

        let parsed: ChatResponse =
            serde_json::from_str(&body).context("Failed to parse chat completions response")?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(answer.trim().to_string())
    }
}
