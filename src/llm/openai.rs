//! OpenAI-compatible Chat Completions provider
//!
//! One implementation serves OpenAI, xAI and Ollama; they share the wire
//! format and differ only in base URL, default model and credentials.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ConnectorError, Result};

use super::provider::{AiProvider, LlmProvider, ProviderOptions};
use super::types::{AiResponse, AiRole, ChatRequest, StopReason, TokenUsage, ToolCallRequest};

/// Chat Completions provider for OpenAI, xAI and Ollama
pub struct OpenAiCompatibleProvider {
    client: Client,
    provider: AiProvider,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for one of the OpenAI-compatible backends
    pub fn new(provider: AiProvider, options: ProviderOptions) -> Result<Self> {
        let api_key = options.resolve_api_key(provider)?;
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            provider,
            api_key,
            model: options.resolve_model(provider),
            base_url: options.resolve_base_url(provider),
        })
    }

    /// Build the request body for the Chat Completions API
    fn build_request(&self, request: &ChatRequest) -> Value {
        let mut messages: Vec<Value> = Vec::new();

        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }

        for message in &request.messages {
            match message.role {
                AiRole::System => {
                    messages.push(json!({"role": "system", "content": message.content}));
                }
                AiRole::User => {
                    messages.push(json!({"role": "user", "content": message.content}));
                }
                AiRole::Assistant => {
                    let mut entry = json!({"role": "assistant", "content": message.content});
                    if !message.tool_calls.is_empty() {
                        let calls: Vec<Value> = message
                            .tool_calls
                            .iter()
                            .map(|call| {
                                json!({
                                    "id": call.id,
                                    "type": "function",
                                    "function": {
                                        "name": call.name,
                                        "arguments": call.arguments.to_string()
                                    }
                                })
                            })
                            .collect();
                        entry["tool_calls"] = json!(calls);
                    }
                    messages.push(entry);
                }
                AiRole::Tool => {
                    messages.push(json!({
                        "role": "tool",
                        "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
                        "content": message.content
                    }));
                }
            }
        }

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_openai_schema()).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    /// Parse the API response into an AiResponse
    fn parse_response(&self, body: Value) -> Result<AiResponse> {
        let choice = body["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ConnectorError::InvalidResponse("missing choices".to_string()))?;

        let message = &choice["message"];
        let content = message["content"].as_str().unwrap_or_default().to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let arguments_raw = call["function"]["arguments"].as_str().unwrap_or("{}");
                // Some backends emit malformed argument JSON; pass it through
                // as a string rather than dropping the call.
                let arguments = serde_json::from_str(arguments_raw)
                    .unwrap_or_else(|_| Value::String(arguments_raw.to_string()));
                tool_calls.push(ToolCallRequest::new(
                    call["id"].as_str().unwrap_or_default(),
                    call["function"]["name"].as_str().unwrap_or_default(),
                    arguments,
                ));
            }
        }

        let stop_reason = match choice["finish_reason"].as_str() {
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };

        let usage = TokenUsage::new(
            body["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            body["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        );

        Ok(AiResponse {
            content,
            model: body["model"].as_str().unwrap_or(&self.model).to_string(),
            provider: self.provider,
            usage,
            tool_calls,
            stop_reason,
        })
    }

    async fn send_request(&self, body: Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = %self.provider, model = %self.model, "sending chat completion request");

        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("authorization", format!("Bearer {key}"));
        }

        let response = req.json(&body).send().await?;

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
impl LlmProvider for OpenAiCompatibleProvider {
    fn provider(&self) -> AiProvider {
        self.provider
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

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
