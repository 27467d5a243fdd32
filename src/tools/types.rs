//! Tool schema value objects
//!
//! Framework-agnostic descriptions of callable tools. Each definition can
//! export itself to the Anthropic, OpenAI and MCP tool formats.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;

/// Category grouping tools by originating vendor or function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Aws,
    Github,
    Slack,
    GoogleCloud,
    Meshy,
    /// Custom tools that do not belong to a vendor connector
    Utility,
}

impl ToolCategory {
    /// String tag used in serialized schemas and tool-name prefixes
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Github => "github",
            Self::Slack => "slack",
            Self::GoogleCloud => "google_cloud",
            Self::Meshy => "meshy",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of declared parameter types
///
/// Every connector method argument must map onto one of these; the mapping
/// to JSON-schema type names is the contract providers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterKind {
    /// JSON-schema type name
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Definition of one tool parameter
///
/// Immutable once constructed; use the builder-style constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ToolParameter {
    /// Create a required parameter
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
            default: None,
            enum_values: None,
        }
    }

    /// Create a required string parameter
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterKind::String)
    }

    /// Create a required number parameter
    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterKind::Number)
    }

    /// Create a required boolean parameter
    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, ParameterKind::Boolean)
    }

    /// Mark optional with a default value
    pub fn optional(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    /// Restrict to an enumerated set of string values (declaration order kept)
    pub fn with_enum_values(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// JSON-schema property object for this parameter
    pub fn to_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.kind.json_type()));
        if !self.description.is_empty() {
            prop.insert("description".to_string(), json!(self.description));
        }
        if let Some(values) = &self.enum_values {
            prop.insert("enum".to_string(), json!(values));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        Value::Object(prop)
    }
}

/// Result of a tool handler invocation
///
/// Never mutated after construction. Vendor-call failures are reported here
/// with `success: false` rather than propagated, so one failing tool does
/// not abort a multi-tool agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ToolResult {
    /// Create a successful result carrying JSON data
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            task_id: None,
        }
    }

    /// Create a failed result with an error message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(message.into()),
            task_id: None,
        }
    }

    /// Attach a vendor task/correlation id
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Serialize to a JSON string for feeding back to the model
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Caller-supplied tool implementation
pub type HandlerFn = dyn Fn(&Value) -> Result<ToolResult> + Send + Sync;

/// How a tool call reaches its implementation
#[derive(Clone)]
pub enum ToolHandler {
    /// Dispatch through the connector instance bound to the tool's category
    Method { method: String },
    /// Direct function, used for manually registered tools
    Func(Arc<HandlerFn>),
}

impl ToolHandler {
    /// Wrap a plain function as a handler
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Result<ToolResult> + Send + Sync + 'static,
    {
        Self::Func(Arc::new(handler))
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method { method } => f.debug_struct("Method").field("method", method).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A named, described, schema-typed callable exposed to an AI agent
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Unique snake_case identifier
    pub name: String,
    /// Human-readable description for the model
    pub description: String,
    pub category: ToolCategory,
    /// Parameters in declaration order
    pub parameters: Vec<ToolParameter>,
    pub handler: ToolHandler,
    /// Whether invoking this tool needs vendor credentials
    pub requires_api_key: bool,
    /// Connector method this tool wraps, if generated from one
    pub method_name: Option<String>,
}

impl ToolDefinition {
    /// Create a tool definition with no parameters
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: ToolCategory,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            parameters: Vec::new(),
            handler,
            requires_api_key: true,
            method_name: None,
        }
    }

    /// Set the parameter list
    pub fn with_parameters(mut self, parameters: Vec<ToolParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Record the wrapped connector method name
    pub fn with_method_name(mut self, method: impl Into<String>) -> Self {
        self.method_name = Some(method.into());
        self
    }

    /// Mark as callable without vendor credentials
    pub fn without_api_key(mut self) -> Self {
        self.requires_api_key = false;
        self
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON-schema object describing the tool input
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.to_schema());
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// Anthropic Messages API tool schema
    pub fn to_anthropic_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema()
        })
    }

    /// OpenAI Chat Completions function schema
    pub fn to_openai_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema()
            }
        })
    }

    /// Model Context Protocol tool schema
    pub fn to_mcp_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema()
        })
    }
}
