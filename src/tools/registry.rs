//! Tool registry
//!
//! Catalog mapping tool name to definition, with a category index and a
//! table of bound connector instances used to dispatch bound-method tools.
//!
//! The registry is an explicitly constructed object; share it as
//! `Arc<ToolRegistry>` with whatever owns the agent session. All mutation
//! happens under one lock guarding the two parallel maps, so the category
//! index never references a name absent from the primary map. Reads clone
//! `Arc`s out and never hold the lock across an await.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use crate::connectors::VendorConnector;
use crate::error::{ConnectorError, Result};

use super::types::{ToolCategory, ToolDefinition, ToolHandler, ToolResult};

#[derive(Default)]
struct RegistryInner {
    tools: HashMap<String, Arc<ToolDefinition>>,
    categories: HashMap<ToolCategory, BTreeSet<String>>,
    instances: HashMap<ToolCategory, Arc<dyn VendorConnector>>,
}

/// Catalog of tool definitions, filterable by category and name
#[derive(Default)]
pub struct ToolRegistry {
    inner: Mutex<RegistryInner>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition
    ///
    /// Fails with `DuplicateTool` if the name is already present, leaving
    /// the existing registration intact.
    pub fn register(&self, tool: ToolDefinition) -> Result<()> {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.tools.contains_key(&tool.name) {
            return Err(ConnectorError::DuplicateTool(tool.name));
        }

        debug!(tool = %tool.name, category = %tool.category, "registering tool");
        let name = tool.name.clone();
        let category = tool.category;
        inner.tools.insert(name.clone(), Arc::new(tool));
        inner.categories.entry(category).or_default().insert(name);
        Ok(())
    }

    /// Remove a tool by name; absent names are a no-op
    pub fn unregister(&self, name: &str) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if let Some(tool) = inner.tools.remove(name) {
            let category = tool.category;
            if let Some(names) = inner.categories.get_mut(&category) {
                names.remove(name);
                if names.is_empty() {
                    inner.categories.remove(&category);
                }
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.tools.get(name).cloned()
    }

    /// Get tools, optionally filtered by category set and/or name set
    ///
    /// Both filters, when given, are applied as intersections; unknown names
    /// are silently ignored. Returns the full catalog sorted by name when
    /// neither filter is given.
    pub fn get_tools(
        &self,
        categories: Option<&[ToolCategory]>,
        names: Option<&[&str]>,
    ) -> Vec<Arc<ToolDefinition>> {
        let inner = self.inner.lock().expect("registry lock poisoned");

        let mut tools: Vec<Arc<ToolDefinition>> = inner.tools.values().cloned().collect();

        if let Some(categories) = categories {
            tools.retain(|t| categories.contains(&t.category));
        }
        if let Some(names) = names {
            tools.retain(|t| names.contains(&t.name.as_str()));
        }

        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// List registered tool names, optionally for one category
    pub fn list_names(&self, category: Option<ToolCategory>) -> Vec<String> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        match category {
            Some(category) => inner
                .categories
                .get(&category)
                .map(|names| names.iter().cloned().collect())
                .unwrap_or_default(),
            None => {
                let mut names: Vec<String> = inner.tools.keys().cloned().collect();
                names.sort();
                names
            }
        }
    }

    /// List categories with at least one registered tool
    pub fn list_categories(&self) -> Vec<ToolCategory> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        let mut categories: Vec<ToolCategory> = inner.categories.keys().copied().collect();
        categories.sort_by_key(|c| c.as_str());
        categories
    }

    /// Bind a connector instance for a category
    ///
    /// One instance per category; a later registration replaces the earlier.
    pub fn register_instance(&self, category: ToolCategory, instance: Arc<dyn VendorConnector>) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.instances.insert(category, instance);
    }

    /// Get the connector instance bound to a category
    pub fn connector_instance(&self, category: ToolCategory) -> Option<Arc<dyn VendorConnector>> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.instances.get(&category).cloned()
    }

    /// Empty the primary map and the category index atomically
    ///
    /// Bound connector instances are kept; intended for test isolation.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.tools.clear();
        inner.categories.clear();
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a tool name is registered
    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.tools.contains_key(name)
    }

    /// Dispatch a tool call by name
    ///
    /// Vendor-call failures come back as `ToolResult { success: false }` so a
    /// single failing tool does not abort a multi-tool agent loop; only an
    /// unknown tool name is an error.
    pub async fn execute(&self, name: &str, args: &Value) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| ConnectorError::UnknownTool(name.to_string()))?;

        match &tool.handler {
            ToolHandler::Func(handler) => {
                Ok(handler(args).unwrap_or_else(|e| ToolResult::error(e.to_string())))
            }
            ToolHandler::Method { method } => {
                let Some(instance) = self.connector_instance(tool.category) else {
                    warn!(tool = %tool.name, category = %tool.category, "no connector instance bound");
                    return Ok(ToolResult::error(
                        ConnectorError::UnboundConnector(tool.category).to_string(),
                    ));
                };
                match instance.call(method, args).await {
                    Ok(result) => Ok(result),
                    Err(e) => {
                        warn!(tool = %tool.name, error = %e, "tool call failed");
                        Ok(ToolResult::error(e.to_string()))
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("registry lock poisoned");
        f.debug_struct("ToolRegistry")
            .field("tools", &inner.tools.len())
            .field("categories", &inner.categories.len())
            .finish()
    }
}
