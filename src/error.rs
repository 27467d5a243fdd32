//! Error types for vendor-connectors
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::tools::ToolCategory;

/// All error types that can occur in this crate
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Required environment variable is missing
    #[error("Missing credential: environment variable {0} not set")]
    MissingCredential(String),

    /// A tool with this name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Tool name not present in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Provider name not in the supported set
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// No connector instance bound for a category
    #[error("No connector instance registered for category '{0}'")]
    UnboundConnector(ToolCategory),

    /// Connector method not declared by the bound connector
    #[error("Connector '{connector}' has no method '{method}'")]
    UnknownMethod { connector: String, method: String },

    /// Tool call arguments do not match the declared parameters
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Vendor or LLM API returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// LLM provider returned something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for vendor-connectors operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
