//! Slack connector
//!
//! Channel history retrieval via the Slack Web API. Slack reports errors
//! in-band with an `ok: false` envelope, so API-level failures surface as
//! failed `ToolResult`s rather than transport errors.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::config;
use crate::error::{ConnectorError, Result};
use crate::tools::{MethodSpec, ToolCategory, ToolParameter, ToolResult};

use super::{VendorConnector, required_str, u64_or};

const SLACK_API_URL: &str = "https://slack.com/api";
const DEFAULT_HISTORY_LIMIT: u64 = 20;

/// Connector for the Slack Web API
pub struct SlackConnector {
    client: Client,
    token: String,
    base_url: String,
}

impl SlackConnector {
    /// Create a connector, reading `SLACK_BOT_TOKEN` from the environment
    pub fn new() -> Result<Self> {
        Ok(Self::with_token(config::require_env("SLACK_BOT_TOKEN")?))
    }

    /// Create a connector with an explicit bot token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            base_url: SLACK_API_URL.to_string(),
        }
    }

    /// Fetch recent messages from a channel
    pub async fn get_channel_history(&self, channel: &str, limit: u64) -> Result<ToolResult> {
        debug!(channel, limit, "fetching slack channel history");

        let response = self
            .client
            .get(format!("{}/conversations.history", self.base_url))
            .header("authorization", format!("Bearer {}", self.token))
            .query(&[("channel", channel), ("limit", &limit.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        if !body["ok"].as_bool().unwrap_or(false) {
            let error = body["error"].as_str().unwrap_or("unknown_error");
            return Ok(ToolResult::error(format!("Slack API error: {error}")));
        }

        let messages: Vec<Value> = body["messages"]
            .as_array()
            .map(|msgs| {
                msgs.iter()
                    .map(|m| {
                        json!({
                            "user": m["user"],
                            "text": m["text"],
                            "timestamp": format_slack_ts(m["ts"].as_str().unwrap_or_default()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ToolResult::ok(json!({
            "channel": channel,
            "count": messages.len(),
            "messages": messages,
        })))
    }
}

/// Render a Slack `ts` value ("1712345678.000200") as a UTC datetime string
fn format_slack_ts(ts: &str) -> String {
    let seconds = ts.split('.').next().and_then(|s| s.parse::<i64>().ok());
    match seconds.and_then(|s| DateTime::from_timestamp(s, 0)) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ts.to_string(),
    }
}

#[async_trait]
impl VendorConnector for SlackConnector {
    fn name(&self) -> &str {
        "slack"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Slack
    }

    fn methods(&self) -> Vec<MethodSpec> {
        vec![
            MethodSpec::new(
                "get_channel_history",
                "Retrieve recent messages from a Slack channel",
            )
            .with_parameters(vec![
                ToolParameter::string("channel", "Channel ID to read history from"),
                ToolParameter::number("limit", "Maximum number of messages to return")
                    .optional(json!(DEFAULT_HISTORY_LIMIT)),
            ]),
        ]
    }

    async fn call(&self, method: &str, args: &Value) -> Result<ToolResult> {
        match method {
            "get_channel_history" => {
                let channel = required_str(args, "channel")?;
                self.get_channel_history(channel, u64_or(args, "limit", DEFAULT_HISTORY_LIMIT))
                    .await
            }
            other => Err(ConnectorError::UnknownMethod {
                connector: self.name().to_string(),
                method: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for SlackConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConnector")
            .field("base_url", &self.base_url)
            .finish()
    }
}
