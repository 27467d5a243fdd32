//! Provider selection and the LlmProvider trait

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{ConnectorError, Result};

use super::anthropic::AnthropicProvider;
use super::google::GoogleProvider;
use super::openai::OpenAiCompatibleProvider;
use super::types::{AiResponse, ChatRequest};

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Anthropic,
    OpenAi,
    Google,
    Xai,
    Ollama,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Xai => "xai",
            Self::Ollama => "ollama",
        }
    }

    /// Environment variable holding the API key; None when no key is needed
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Xai => Some("XAI_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Model used when the caller does not pick one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
            Self::Google => "gemini-2.0-flash",
            Self::Xai => "grok-3",
            Self::Ollama => "llama3.2",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
            Self::Xai => "https://api.x.ai/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "google" => Ok(Self::Google),
            "xai" => Ok(Self::Xai),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConnectorError::UnknownProvider(other.to_string())),
        }
    }
}

/// Construction options shared by all providers
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Model identifier; provider default when None
    pub model: Option<String>,
    /// Explicit API key; looked up from the environment when None
    pub api_key: Option<String>,
    /// Base URL override (self-hosted gateways, Ollama hosts)
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(300),
        }
    }
}

impl ProviderOptions {
    /// Resolve the API key from options or environment
    ///
    /// Missing credentials are a configuration error raised here at
    /// construction, never mid-call. Providers without keys resolve to None.
    pub fn resolve_api_key(&self, provider: AiProvider) -> Result<Option<String>> {
        if let Some(key) = &self.api_key {
            return Ok(Some(key.clone()));
        }
        match provider.api_key_var() {
            Some(var) => config::require_env(var).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve the model identifier
    pub fn resolve_model(&self, provider: AiProvider) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// Resolve the base URL
    pub fn resolve_base_url(&self, provider: AiProvider) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string())
    }
}

/// Stateless LLM provider - each call is independent
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which provider this is
    fn provider(&self) -> AiProvider;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Single completion request (blocking until complete)
    async fn chat(&self, request: ChatRequest) -> Result<AiResponse>;
}

/// Construct a provider implementation for the chosen provider tag
pub fn build_provider(provider: AiProvider, options: ProviderOptions) -> Result<Box<dyn LlmProvider>> {
    Ok(match provider {
        AiProvider::Anthropic => Box::new(AnthropicProvider::new(options)?),
        AiProvider::OpenAi | AiProvider::Xai | AiProvider::Ollama => {
            Box::new(OpenAiCompatibleProvider::new(provider, options)?)
        }
        AiProvider::Google => Box::new(GoogleProvider::new(options)?),
    })
}
