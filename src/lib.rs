//! vendor-connectors - AI agent tooling over vendor APIs
//!
//! This crate wires LLM providers to vendor HTTP APIs through a typed tool
//! layer:
//! - `tools`: tool definitions, the registry, and the factory that generates
//!   definitions from connector method specs
//! - `connectors`: authenticated vendor clients (GitHub, Slack, Meshy)
//!   behind the `VendorConnector` trait
//! - `llm`: provider clients for Anthropic, OpenAI-compatible APIs and
//!   Gemini behind the `LlmProvider` trait
//! - `agent`: the `AiConnector` orchestrator that drives the tool-use loop

pub mod agent;
pub mod config;
pub mod connectors;
pub mod error;
pub mod llm;
pub mod tools;

pub use agent::{AiConnector, InvokeOptions, InvokeOutcome};
pub use error::{ConnectorError, Result};
