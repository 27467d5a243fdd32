//! AI connector - the agent-facing orchestrator
//!
//! `AiConnector` ties a provider client to a tool registry: it registers
//! connector-generated tools, runs plain chat turns, and drives the
//! tool-use loop in `invoke` until the model stops asking for tools or the
//! iteration cap is reached.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::connectors::VendorConnector;
use crate::error::{ConnectorError, Result};
use crate::llm::{
    AiMessage, AiProvider, AiResponse, ChatRequest, LlmProvider, ProviderOptions, TokenUsage,
    build_provider,
};
use crate::tools::{ToolCategory, ToolDefinition, ToolFactory, ToolRegistry, ToolResult};

/// Default cap on provider round-trips inside one `invoke` call
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Options controlling one `invoke` call
#[derive(Clone)]
pub struct InvokeOptions<'a> {
    /// When false, degrade to a plain chat turn
    pub use_tools: bool,
    /// Restrict tools to these categories
    pub categories: Option<&'a [ToolCategory]>,
    /// Restrict tools to these names
    pub tool_names: Option<&'a [&'a str]>,
    /// System prompt for this call
    pub system_prompt: Option<&'a str>,
    /// Cap on provider round-trips before returning the best partial answer
    pub max_iterations: u32,
}

impl Default for InvokeOptions<'_> {
    fn default() -> Self {
        Self {
            use_tools: true,
            categories: None,
            tool_names: None,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Result of one `invoke` call, with per-loop accounting
#[derive(Debug)]
pub struct InvokeOutcome {
    /// Final text answer from the model
    pub content: String,
    /// Names of tools executed across all iterations, in call order
    pub tools_used: Vec<String>,
    /// Provider round-trips consumed
    pub iterations: u32,
    /// Token usage accumulated across all rounds
    pub usage: TokenUsage,
    /// True when the loop hit `max_iterations` with tool calls still pending
    pub truncated: bool,
}

/// Provider client plus tool registry, driven as one agent session
pub struct AiConnector {
    provider: Box<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    factory: ToolFactory,
    max_tokens: u32,
    temperature: f32,
}

impl AiConnector {
    /// Create a connector for a provider with default options and a fresh
    /// registry
    ///
    /// Credentials are resolved here; a missing API key fails construction
    /// rather than the first call.
    pub fn new(provider: AiProvider) -> Result<Self> {
        Self::with_options(provider, ProviderOptions::default())
    }

    /// Create a connector with explicit provider options
    pub fn with_options(provider: AiProvider, options: ProviderOptions) -> Result<Self> {
        Ok(Self::from_provider(build_provider(provider, options)?))
    }

    /// Wrap an already-built provider client
    pub fn from_provider(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            registry: Arc::new(ToolRegistry::new()),
            factory: ToolFactory::new(),
            max_tokens: ChatRequest::default().max_tokens,
            temperature: ChatRequest::default().temperature,
        }
    }

    /// Share an existing registry instead of the connector's own
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the response token cap for all calls
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature for all calls
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Which provider this connector talks to
    pub fn provider(&self) -> AiProvider {
        self.provider.provider()
    }

    /// Model identifier used for requests
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Handle to the tool registry
    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    /// Register one tool definition
    pub fn register_tool(&self, tool: ToolDefinition) -> Result<()> {
        self.registry.register(tool)
    }

    /// Generate and register tools for a connector's declared methods
    ///
    /// The connector instance is bound to its category so generated tools can
    /// dispatch through it. Names already registered are skipped, so repeated
    /// registration of the same connector is harmless. Returns the names
    /// actually registered by this call.
    pub fn register_connector_tools(
        &self,
        connector: Arc<dyn VendorConnector>,
        method_filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Vec<String> {
        let tools = self.factory.from_connector(connector.as_ref(), method_filter);
        self.registry
            .register_instance(connector.category(), connector);

        let mut registered = Vec::new();
        for tool in tools {
            let name = tool.name.clone();
            match self.registry.register(tool) {
                Ok(()) => registered.push(name),
                Err(ConnectorError::DuplicateTool(_)) => {
                    debug!(tool = %name, "tool already registered, skipping");
                }
                Err(e) => warn!(tool = %name, error = %e, "failed to register tool"),
            }
        }
        registered
    }

    /// List registered tool names, optionally for one category
    pub fn list_tools(&self, category: Option<ToolCategory>) -> Vec<String> {
        self.registry.list_names(category)
    }

    /// One plain chat turn, no tools
    pub async fn chat(
        &self,
        message: &str,
        system_prompt: Option<&str>,
        history: Option<&[AiMessage]>,
    ) -> Result<AiResponse> {
        let mut request = ChatRequest::new()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);
        if let Some(system) = system_prompt {
            request = request.with_system(system);
        }
        if let Some(history) = history {
            request.messages.extend_from_slice(history);
        }
        request = request.with_user_message(message);

        self.provider.chat(request).await
    }

    /// Run a message through the tool-use loop
    ///
    /// Each round sends the conversation with the selected tools, executes
    /// every call the model requests, appends the results, and repeats until
    /// the model answers without tool calls or `max_iterations` rounds have
    /// run. Hitting the cap returns the last response text with `truncated`
    /// set rather than an error. A call naming a tool outside the offered
    /// set is answered with a failed result, not executed and not fatal.
    /// With tools disabled, no tools registered, or filters matching
    /// nothing, this degrades to a plain chat turn.
    pub async fn invoke(&self, message: &str, options: InvokeOptions<'_>) -> Result<InvokeOutcome> {
        let tools = if options.use_tools {
            self.registry.get_tools(options.categories, options.tool_names)
        } else {
            Vec::new()
        };

        if tools.is_empty() {
            let response = self.chat(message, options.system_prompt, None).await?;
            return Ok(InvokeOutcome {
                content: response.content,
                tools_used: Vec::new(),
                iterations: 1,
                usage: response.usage,
                truncated: false,
            });
        }

        debug!(tools = tools.len(), "starting tool-use loop");

        let mut messages = vec![AiMessage::user(message)];
        let mut tools_used = Vec::new();
        let mut usage = TokenUsage::default();
        let mut last_content = String::new();

        for iteration in 1..=options.max_iterations {
            let mut request = ChatRequest::new()
                .with_tools(tools.clone())
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature);
            if let Some(system) = options.system_prompt {
                request = request.with_system(system);
            }
            request.messages = messages.clone();

            let response = self.provider.chat(request).await?;
            usage.add(&response.usage);
            if !response.content.is_empty() {
                last_content = response.content.clone();
            }

            if !response.has_tool_calls() {
                return Ok(InvokeOutcome {
                    content: response.content,
                    tools_used,
                    iterations: iteration,
                    usage,
                    truncated: false,
                });
            }

            messages.push(AiMessage::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                // Calls are resolved against the offered set, not the whole
                // registry, so filters hold and hallucinated names come back
                // to the model as failed results instead of ending the loop.
                let result = if tools.iter().any(|t| t.name == call.name) {
                    info!(tool = %call.name, iteration, "executing tool call");
                    tools_used.push(call.name.clone());
                    match self.registry.execute(&call.name, &call.arguments).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(tool = %call.name, error = %e, "tool dispatch failed");
                            ToolResult::error(e.to_string())
                        }
                    }
                } else {
                    warn!(tool = %call.name, "model requested a tool outside the offered set");
                    ToolResult::error(ConnectorError::UnknownTool(call.name.clone()).to_string())
                };
                messages.push(AiMessage::tool_result(
                    result.to_json(),
                    &call.id,
                    &call.name,
                ));
            }
        }

        // Cap reached with calls still pending: hand back what we have
        warn!(
            max_iterations = options.max_iterations,
            "tool loop hit iteration cap"
        );
        Ok(InvokeOutcome {
            content: last_content,
            tools_used,
            iterations: options.max_iterations,
            usage,
            truncated: true,
        })
    }
}

impl std::fmt::Debug for AiConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConnector")
            .field("provider", &self.provider.provider())
            .field("model", &self.provider.model())
            .field("registry", &self.registry)
            .finish()
    }
}
