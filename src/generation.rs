//! Candidate question generation.
//!
//! The acquisition loop treats the language model as an opaque text
//! generator behind [`TextGenerator`]. Implementations make a single call and
//! report failure as an error: the loop's attempt budget is the only retry
//! policy, so a failed generation simply consumes one attempt.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::embedding::post_with_retry;

/// Produces one candidate question per call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self) -> Result<String>;
}

/// Generator used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self) -> Result<String> {
        bail!("Generation provider is disabled")
    }
}

/// Chat-completions generator backed by the OpenAI API.
///
/// Sends the configured system and user prompts with the configured
/// temperature and token cap. Requires `OPENAI_API_KEY`.
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    body: serde_json::Value,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            body: completion_request(config),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    async fn generate(&self) -> Result<String> {
        let json = post_with_retry(
            &self.client,
            &format!("{}/chat/completions", self.base_url),
            &self.api_key,
            &self.body,
            0,
        )
        .await?;

        parse_completion(&json)
    }
}

fn completion_request(config: &GenerationConfig) -> serde_json::Value {
    serde_json::json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": config.system_prompt },
            { "role": "user", "content": config.user_prompt },
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    })
}

/// Extract `choices[0].message.content`, trimmed. Empty content is a failure.
fn parse_completion(json: &serde_json::Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing content"))?
        .trim();

    if content.is_empty() {
        bail!("Completion response was empty");
    }

    Ok(content.to_string())
}

/// Create the appropriate [`TextGenerator`] based on configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAIGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
