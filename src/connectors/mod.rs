//! Vendor connectors - thin authenticated passthroughs to vendor HTTP APIs
//!
//! Each connector holds credentials read from the environment at
//! construction and forwards calls to the vendor API, reformatting the
//! response into a `ToolResult`. The `VendorConnector` trait is the seam
//! through which the tool factory and registry see a connector: a name, a
//! category, a declarative method list, and a dispatch entry point.

pub mod github;
pub mod meshy;
pub mod slack;

pub use github::GithubConnector;
pub use meshy::MeshyConnector;
pub use slack::SlackConnector;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ConnectorError, Result};
use crate::tools::{MethodSpec, ToolCategory, ToolResult};

/// A per-vendor object wrapping authentication and call forwarding
#[async_trait]
pub trait VendorConnector: Send + Sync {
    /// Short vendor name, used as the tool-name prefix (e.g. "github")
    fn name(&self) -> &str;

    /// Category its generated tools register under
    fn category(&self) -> ToolCategory;

    /// Declarative list of callable methods
    fn methods(&self) -> Vec<MethodSpec>;

    /// Dispatch one method call with JSON keyword arguments
    async fn call(&self, method: &str, args: &Value) -> Result<ToolResult>;
}

/// Extract a required string argument
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args[name]
        .as_str()
        .ok_or_else(|| ConnectorError::InvalidArguments(format!("missing '{name}' parameter")))
}

/// Extract an optional string argument with a default
pub(crate) fn str_or<'a>(args: &'a Value, name: &str, default: &'a str) -> &'a str {
    args[name].as_str().unwrap_or(default)
}

/// Extract an optional boolean argument with a default
pub(crate) fn bool_or(args: &Value, name: &str, default: bool) -> bool {
    args[name].as_bool().unwrap_or(default)
}

/// Extract an optional integer argument with a default
pub(crate) fn u64_or(args: &Value, name: &str, default: u64) -> u64 {
    args[name].as_u64().unwrap_or(default)
}
