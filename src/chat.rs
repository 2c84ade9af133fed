//! Posting the daily question to a chat channel.
//!
//! | Config Value | Poster |
//! |-------------|--------|
//! | `"stdout"` | [`StdoutPoster`] |
//! | `"slack"` | [`SlackPoster`] |

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::ChatConfig;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[async_trait]
pub trait ChatPoster: Send + Sync {
    /// Post an already-formatted message.
    async fn post(&self, message: &str) -> Result<()>;
}

/// Build the message posted for a daily question.
pub fn format_question_message(mention: Option<&str>, question: &str) -> String {
    let header = ":wave: *Daily Team Question* :thinking_face:";
    let header = match mention.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!("{} {}", m, header),
        None => header.to_string(),
    };
    format!(
        "{}\n\n{}\n\n_Reply in channel to share your answer!_",
        header, question
    )
}

/// Writes messages to stdout. The default, and what `--dry-run` uses.
pub struct StdoutPoster;

#[async_trait]
impl ChatPoster for StdoutPoster {
    async fn post(&self, message: &str) -> Result<()> {
        println!("{}", message);
        Ok(())
    }
}

/// Posts via Slack's `chat.postMessage` Web API.
///
/// Requires `SLACK_BOT_TOKEN` in the environment.
pub struct SlackPoster {
    client: reqwest::Client,
    token: String,
    channel_id: String,
}

impl SlackPoster {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let token = std::env::var("SLACK_BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("SLACK_BOT_TOKEN environment variable not set"))?;
        let channel_id = config
            .channel_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow::anyhow!("chat.channel_id required for Slack"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token,
            channel_id,
        })
    }
}

#[async_trait]
impl ChatPoster for SlackPoster {
    async fn post(&self, message: &str) -> Result<()> {
        let body = serde_json::json!({
            "channel": self.channel_id,
            "text": message,
            "unfurl_links": false,
        });

        let response = self
            .client
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Slack request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Slack API error {}: {}", status, text);
        }

        let json: serde_json::Value = response.json().await?;
        check_slack_response(&json)
    }
}

/// Slack reports most failures as HTTP 200 with `"ok": false`.
fn check_slack_response(json: &serde_json::Value) -> Result<()> {
    if json.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(());
    }
    let error = json
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown_error");
    bail!("Slack rejected the message: {}", error)
}

pub fn create_poster(config: &ChatConfig) -> Result<Box<dyn ChatPoster>> {
    match config.provider.as_str() {
        "stdout" => Ok(Box::new(StdoutPoster)),
        "slack" => Ok(Box::new(SlackPoster::new(config)?)),
        other => bail!("Unknown chat provider: {}", other),
    }
}
