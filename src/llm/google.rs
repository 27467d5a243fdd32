//! Google Gemini generateContent provider
//!
//! Gemini uses functionCall / functionResponse parts and has no per-call
//! ids; calls are correlated by function name instead.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ConnectorError, Result};

use super::provider::{AiProvider, LlmProvider, ProviderOptions};
use super::types::{AiResponse, AiRole, ChatRequest, StopReason, TokenUsage, ToolCallRequest};

/// Google Gemini API provider
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GoogleProvider {
    /// Create a provider, reading `GOOGLE_API_KEY` unless a key is given
    pub fn new(options: ProviderOptions) -> Result<Self> {
        let api_key = options
            .resolve_api_key(AiProvider::Google)?
            .unwrap_or_default();
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            model: options.resolve_model(AiProvider::Google),
            base_url: options.resolve_base_url(AiProvider::Google),
        })
    }

    /// Build the generateContent request body
    fn build_request(&self, request: &ChatRequest) -> Value {
        let mut system = request.system.clone().unwrap_or_default();
        let mut contents: Vec<Value> = Vec::new();

        for message in &request.messages {
            match message.role {
                AiRole::System => {
                    if !system.is_empty() {
                        system.push('\n');
                    }
                    system.push_str(&message.content);
                }
                AiRole::User => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": message.content}]
                    }));
                }
                AiRole::Assistant => {
                    let mut parts = Vec::new();
                    if !message.content.is_empty() {
                        parts.push(json!({"text": message.content}));
                    }
                    for call in &message.tool_calls {
                        parts.push(json!({
                            "functionCall": {"name": call.name, "args": call.arguments}
                        }));
                    }
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                AiRole::Tool => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{
                            "functionResponse": {
                                "name": message.name.clone().unwrap_or_default(),
                                "response": {"content": message.content}
                            }
                        }]
                    }));
                }
            }
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens
            }
        });

        if !system.is_empty() {
            body["system_instruction"] = json!({"parts": [{"text": system}]});
        }
        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema()
                    })
                })
                .collect();
            body["tools"] = json!([{"function_declarations": declarations}]);
        }

        body
    }

    /// Parse the generateContent response
    fn parse_response(&self, body: Value) -> Result<AiResponse> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ConnectorError::InvalidResponse("missing candidates".to_string()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(parts) = candidate["content"]["parts"].as_array() {
            for part in parts {
                if let Some(text) = part["text"].as_str() {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(text);
                }
                if part["functionCall"].is_object() {
                    let name = part["functionCall"]["name"].as_str().unwrap_or_default();
                    // No call ids on this wire format; correlate by name
                    tool_calls.push(ToolCallRequest::new(
                        name,
                        name,
                        part["functionCall"]["args"].clone(),
                    ));
                }
            }
        }

        let stop_reason = if !tool_calls.is_empty() {
            StopReason::ToolUse
        } else {
            match candidate["finishReason"].as_str() {
                Some("MAX_TOKENS") => StopReason::MaxTokens,
                _ => StopReason::EndTurn,
            }
        };

        let usage = TokenUsage::new(
            body["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0),
            body["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0),
        );

        Ok(AiResponse {
            content,
            model: self.model.clone(),
            provider: AiProvider::Google,
            usage,
            tool_calls,
            stop_reason,
        })
    }

    async fn send_request(&self, body: Value) -> Result<Value> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "sending gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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
impl LlmProvider for GoogleProvider {
    fn provider(&self) -> AiProvider {
        AiProvider::Google
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

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::AiMessage;

    fn test_provider() -> GoogleProvider {
        GoogleProvider::new(ProviderOptions {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_build_request_roles() {
        let provider = test_provider();
        let request = ChatRequest::new()
            .with_system("Be helpful")
            .with_user_message("Hi")
            .with_message(AiMessage::assistant("Hello"));

        let body = provider.build_request(&request);
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "Be helpful");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
    }

    #[test]
    fn test_build_request_function_round_trip() {
        let provider = test_provider();
        let call = ToolCallRequest::new(
            "meshy_generate_model",
            "meshy_generate_model",
            json!({"prompt": "a chair"}),
        );
        let request = ChatRequest::new()
            .with_user_message("Make a chair")
            .with_message(AiMessage::assistant_with_tool_calls("", vec![call]))
            .with_message(AiMessage::tool_result(
                "{\"success\":true}",
                "meshy_generate_model",
                "meshy_generate_model",
            ));

        let body = provider.build_request(&request);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(
            contents[1]["parts"][0]["functionCall"]["name"],
            "meshy_generate_model"
        );
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"]["name"],
            "meshy_generate_model"
        );
    }

    #[test]
    fn test_parse_response_text() {
        let provider = test_provider();
        let response = provider
            .parse_response(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Done"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 2}
            }))
            .unwrap();

        assert_eq!(response.content, "Done");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total(), 9);
    }

    #[test]
    fn test_parse_response_function_call() {
        let provider = test_provider();
        let response = provider
            .parse_response(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{
                            "functionCall": {
                                "name": "github_list_repositories",
                                "args": {"type_filter": "all"}
                            }
                        }]
                    },
                    "finishReason": "STOP"
                }]
            }))
            .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "github_list_repositories");
        assert_eq!(response.stop_reason, StopReason::ToolUse);
    }

    #[test]
    fn test_parse_response_missing_candidates() {
        let provider = test_provider();
        let result = provider.parse_response(json!({}));
        assert!(matches!(result, Err(ConnectorError::InvalidResponse(_))));
    }
}
