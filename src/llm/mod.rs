//! LLM Provider Layer - unified conversation format and per-provider clients
//!
//! This module provides:
//! - Message and response types shared across providers
//! - The LlmProvider trait and provider selection
//! - Anthropic, OpenAI-compatible (OpenAI/xAI/Ollama) and Gemini clients

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiCompatibleProvider;
pub use provider::{AiProvider, LlmProvider, ProviderOptions, build_provider};
pub use types::{
    AiMessage, AiResponse, AiRole, ChatRequest, StopReason, TokenUsage, ToolCallRequest,
};
