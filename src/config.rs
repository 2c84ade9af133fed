//! TOML configuration parsing and validation.
//!
//! The whole bot is driven by one file (default `./config/dq.toml`). It is
//! loaded once by the CLI and then handed to every component by reference;
//! nothing in the crate reads configuration from globals.
//!
//! API keys are deliberately absent: `OPENAI_API_KEY` and `SLACK_BOT_TOKEN`
//! come from the environment and are checked by the providers that need them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Duplicate-detection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SimilarityConfig {
    /// Cosine similarity at or above which two questions count as the same.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    0.85
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Sent to the API as `dimensions`; vectors of any other length are rejected.
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: default_embedding_model(),
            dims: default_dims(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            base_url: default_openai_base_url(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Question generation settings.
///
/// Prompt, temperature and attempt cap are all configuration so that
/// different deployments (or a one-off themed week) can vary them without
/// touching the acquisition loop.
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on generator calls per posting cycle.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: default_generation_model(),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            base_url: default_openai_base_url(),
        }
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_chat_provider")]
    pub provider: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Prefix placed before the message, e.g. `<!channel>`.
    #[serde(default)]
    pub mention: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_chat_provider(),
            channel_id: None,
            mention: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f64 {
    0.9
}
fn default_max_tokens() -> u32 {
    100
}
fn default_max_attempts() -> u32 {
    12
}
fn default_chat_provider() -> String {
    "stdout".to_string()
}
fn default_bind() -> String {
    "0.0.0.0:10000".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant that generates engaging, thought-provoking personal \
     questions for a remote team to answer in chat. Your goal is to create highly unique \
     personal questions that have not been asked before. Focus exclusively on respectful \
     personal insights that foster team bonding without crossing professional boundaries. \
     Vary your question formats, topics, and themes, and avoid starting questions in \
     similar ways."
        .to_string()
}

fn default_user_prompt() -> String {
    "Generate a truly unique personal question for our remote team's daily team building \
     activity. Make it thought-provoking and conversation-sparking without being too \
     similar to common icebreaker questions. Reply with the question only."
        .to_string()
}

impl Config {
    /// A config with every external provider disabled, backed by the given
    /// database path. Used by tests and by commands that only touch history.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            similarity: SimilarityConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            chat: ChatConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Check cross-field invariants. Called by [`load_config`].
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity.threshold) {
            anyhow::bail!("similarity.threshold must be in [0.0, 1.0]");
        }

        if self.generation.max_attempts == 0 {
            anyhow::bail!("generation.max_attempts must be >= 1");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
        }

        if self.embedding.is_enabled() {
            if self.embedding.dims == 0 {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model.trim().is_empty() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        match self.embedding.provider.as_str() {
            "disabled" | "openai" => {}
            other => anyhow::bail!(
                "Unknown embedding provider: '{}'. Must be disabled or openai.",
                other
            ),
        }

        match self.generation.provider.as_str() {
            "disabled" | "openai" => {}
            other => anyhow::bail!(
                "Unknown generation provider: '{}'. Must be disabled or openai.",
                other
            ),
        }

        match self.chat.provider.as_str() {
            "stdout" => {}
            "slack" => {
                if self.chat.channel_id.as_deref().unwrap_or("").is_empty() {
                    anyhow::bail!("chat.channel_id must be set when provider is 'slack'");
                }
            }
            other => anyhow::bail!(
                "Unknown chat provider: '{}'. Must be stdout or slack.",
                other
            ),
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
