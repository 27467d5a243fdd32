//! Environment-based credential lookup
//!
//! Connectors and providers authenticate with credentials supplied through
//! environment variables. Missing variables surface as configuration errors
//! at construction time, never mid-call.

use crate::error::{ConnectorError, Result};

/// Read a required environment variable, failing with a configuration error
pub fn require_env(var: &str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConnectorError::MissingCredential(var.to_string()))
}
