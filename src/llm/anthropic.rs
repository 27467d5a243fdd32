//! Anthropic Messages API provider
//!
//! Converts the unified conversation format into Anthropic content blocks
//! (tool_use / tool_result) and back.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ConnectorError, Result};

use super::provider::{AiProvider, LlmProvider, ProviderOptions};
use super::types::{AiMessage, AiResponse, AiRole, ChatRequest, StopReason, TokenUsage, ToolCallRequest};

use async_trait::async_trait;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a provider, reading `ANTHROPIC_API_KEY` unless a key is given
    pub fn new(options: ProviderOptions) -> Result<Self> {
        let api_key = options
            .resolve_api_key(AiProvider::Anthropic)?
            .unwrap_or_default();
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model: options.resolve_model(AiProvider::Anthropic),
            base_url: options.resolve_base_url(AiProvider::Anthropic),
        })
    }

    /// Build the request body for the Messages API
    fn build_request(&self, request: &ChatRequest) -> Value {
        let mut system = request.system.clone().unwrap_or_default();
        let mut messages: Vec<Value> = Vec::new();
        // Consecutive tool results merge into one user message, since the
        // API requires alternating user/assistant roles.
        let mut pending_results: Vec<Value> = Vec::new();

        for message in &request.messages {
            if message.role != AiRole::Tool && !pending_results.is_empty() {
                messages.push(json!({
                    "role": "user",
                    "content": std::mem::take(&mut pending_results)
                }));
            }

            match message.role {
                AiRole::System => {
                    if !system.is_empty() {
                        system.push('\n');
                    }
                    system.push_str(&message.content);
                }
                AiRole::User => {
                    messages.push(json!({"role": "user", "content": message.content}));
                }
                AiRole::Assistant => {
                    if message.tool_calls.is_empty() {
                        messages.push(json!({"role": "assistant", "content": message.content}));
                    } else {
                        let mut blocks = Vec::new();
                        if !message.content.is_empty() {
                            blocks.push(json!({"type": "text", "text": message.content}));
                        }
                        for call in &message.tool_calls {
                            blocks.push(json!({
                                "type": "tool_use",
                                "id": call.id,
                                "name": call.name,
                                "input": call.arguments
                            }));
                        }
                        messages.push(json!({"role": "assistant", "content": blocks}));
                    }
                }
                AiRole::Tool => {
                    pending_results.push(json!({
                        "type": "tool_result",
                        "tool_use_id": message.tool_call_id.clone().unwrap_or_default(),
                        "content": message.content
                    }));
                }
            }
        }
        if !pending_results.is_empty() {
            messages.push(json!({"role": "user", "content": pending_results}));
        }

        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages
        });

        if !system.is_empty() {
            body["system"] = json!(system);
        }
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_anthropic_schema()).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    /// Parse the API response into an AiResponse
    fn parse_response(&self, body: Value) -> Result<AiResponse> {
        let stop_reason = match body["stop_reason"].as_str() {
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };

        let usage = TokenUsage::new(
            body["usage"]["input_tokens"].as_u64().unwrap_or(0),
            body["usage"]["output_tokens"].as_u64().unwrap_or(0),
        );

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| ConnectorError::InvalidResponse("missing content array".to_string()))?;

        for block in blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str() {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    tool_calls.push(ToolCallRequest::new(
                        block["id"].as_str().unwrap_or_default(),
                        block["name"].as_str().unwrap_or_default(),
                        block["input"].clone(),
                    ));
                }
                _ => {}
            }
        }

        Ok(AiResponse {
            content,
            model: body["model"].as_str().unwrap_or(&self.model).to_string(),
            provider: AiProvider::Anthropic,
            usage,
            tool_calls,
            stop_reason,
        })
    }

    async fn send_request(&self, body: Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = %self.model, "sending anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
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

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<AiResponse> {
        let body = self.build_request(&request);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolCategory, ToolDefinition, ToolHandler, ToolParameter};
    use std::sync::Arc;

    fn test_provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderOptions {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn repo_tool() -> Arc<ToolDefinition> {
        Arc::new(
            ToolDefinition::new(
                "github_list_repositories",
                "List repositories",
                ToolCategory::Github,
                ToolHandler::Method {
                    method: "list_repositories".to_string(),
                },
            )
            .with_parameters(vec![ToolParameter::string("type_filter", "Filter")]),
        )
    }

    #[test]
    fn test_build_request_basic() {
        let provider = test_provider();
        let request = ChatRequest::new()
            .with_system("You are helpful")
            .with_user_message("Hello");

        let body = provider.build_request(&request);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_build_request_with_tools() {
        let provider = test_provider();
        let request = ChatRequest::new()
            .with_user_message("List my repos")
            .with_tools(vec![repo_tool()]);

        let body = provider.build_request(&request);

        assert!(body["tools"].is_array());
        assert_eq!(body["tools"][0]["name"], "github_list_repositories");
        assert!(body["tools"][0]["input_schema"].is_object());
    }

    #[test]
    fn test_build_request_tool_round_trip_messages() {
        let provider = test_provider();
        let call = ToolCallRequest::new("toolu_1", "github_list_repositories", json!({}));
        let request = ChatRequest::new()
            .with_user_message("List repos")
            .with_message(AiMessage::assistant_with_tool_calls("Checking", vec![call]))
            .with_message(AiMessage::tool_result(
                "{\"success\":true}",
                "toolu_1",
                "github_list_repositories",
            ));

        let body = provider.build_request(&request);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);

        // Assistant turn carries text + tool_use blocks
        assert_eq!(messages[1]["content"][0]["type"], "text");
        assert_eq!(messages[1]["content"][1]["type"], "tool_use");
        assert_eq!(messages[1]["content"][1]["id"], "toolu_1");

        // Tool result becomes a user message with a tool_result block
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"][0]["type"], "tool_result");
        assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_consecutive_tool_results_merge() {
        let provider = test_provider();
        let request = ChatRequest::new()
            .with_user_message("Do two things")
            .with_message(AiMessage::assistant_with_tool_calls(
                "",
                vec![
                    ToolCallRequest::new("toolu_1", "a", json!({})),
                    ToolCallRequest::new("toolu_2", "b", json!({})),
                ],
            ))
            .with_message(AiMessage::tool_result("r1", "toolu_1", "a"))
            .with_message(AiMessage::tool_result("r2", "toolu_2", "b"));

        let body = provider.build_request(&request);
        let messages = body["messages"].as_array().unwrap();
        // user, assistant, single merged user turn with both results
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_system_message_folded_into_system() {
        let provider = test_provider();
        let request = ChatRequest::new()
            .with_message(AiMessage::system("Extra instruction"))
            .with_user_message("Hi");

        let body = provider.build_request(&request);
        assert_eq!(body["system"], "Extra instruction");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response_text_only() {
        let provider = test_provider();
        let response = provider
            .parse_response(json!({
                "model": "claude-sonnet-4-20250514",
                "content": [{"type": "text", "text": "Hello there!"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }))
            .unwrap();

        assert_eq!(response.content, "Hello there!");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 15);
        assert_eq!(response.provider, AiProvider::Anthropic);
    }

    #[test]
    fn test_parse_response_with_tool_use() {
        let provider = test_provider();
        let response = provider
            .parse_response(json!({
                "content": [
                    {"type": "text", "text": "Let me check"},
                    {
                        "type": "tool_use",
                        "id": "toolu_123",
                        "name": "github_list_repositories",
                        "input": {"type_filter": "public"}
                    }
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 50, "output_tokens": 30}
            }))
            .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "toolu_123");
        assert_eq!(response.tool_calls[0].arguments["type_filter"], "public");
        assert!(response.stop_reason.needs_continuation());
    }

    #[test]
    fn test_parse_response_missing_content_is_error() {
        let provider = test_provider();
        let result = provider.parse_response(json!({"stop_reason": "end_turn"}));
        assert!(matches!(result, Err(ConnectorError::InvalidResponse(_))));
    }

    #[test]
    fn test_missing_api_key() {
        // Explicit empty options fall back to the environment
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        // SAFETY: restored before the test returns
        unsafe {
            std::env::remove_var("ANTHROPIC_API_KEY");
        }

        let result = AnthropicProvider::new(ProviderOptions::default());
        assert!(matches!(result, Err(ConnectorError::MissingCredential(_))));

        if let Some(key) = original {
            // SAFETY: restoring prior state
            unsafe {
                std::env::set_var("ANTHROPIC_API_KEY", key);
            }
        }
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = test_provider();
        let debug_str = format!("{provider:?}");
        assert!(debug_str.contains("AnthropicProvider"));
        assert!(!debug_str.contains("test-key"));
    }
}
