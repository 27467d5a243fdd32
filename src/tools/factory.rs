//! Declarative tool-definition generation
//!
//! Connectors enumerate their callable methods as `MethodSpec`s; the factory
//! turns each one into a `ToolDefinition` with a vendor-prefixed name and a
//! handler bound through the registry's connector-instance table. A spec
//! that cannot be converted is skipped with a warning, never failing the
//! whole batch.

use tracing::warn;

use crate::connectors::VendorConnector;
use crate::error::Result;
use crate::tools::{ToolCategory, ToolDefinition, ToolHandler, ToolParameter, ToolResult};

/// Declarative description of one connector method
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method identifier (snake_case)
    pub name: String,
    /// First documentation line; a placeholder is generated when empty
    pub description: String,
    /// Parameters in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl MethodSpec {
    /// Create a method spec with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Set the parameter list
    pub fn with_parameters(mut self, parameters: Vec<ToolParameter>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Generates `ToolDefinition`s from connector method specs
#[derive(Debug, Default)]
pub struct ToolFactory;

impl ToolFactory {
    pub fn new() -> Self {
        Self
    }

    /// Generate one tool definition per declared connector method
    ///
    /// Names are prefixed with the connector name (`github_`, `slack_`, ...)
    /// for global uniqueness across connectors. `method_filter`, when given,
    /// restricts generation to matching method names.
    pub fn from_connector(
        &self,
        connector: &dyn VendorConnector,
        method_filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Vec<ToolDefinition> {
        let mut tools = Vec::new();

        for method in connector.methods() {
            if let Some(filter) = method_filter {
                if !filter(&method.name) {
                    continue;
                }
            }

            match self.tool_from_method(connector, &method) {
                Ok(tool) => tools.push(tool),
                Err(reason) => {
                    warn!(
                        connector = connector.name(),
                        method = %method.name,
                        reason,
                        "skipping tool generation for method"
                    );
                }
            }
        }

        tools
    }

    /// Convert a single method spec into a tool definition
    fn tool_from_method(
        &self,
        connector: &dyn VendorConnector,
        method: &MethodSpec,
    ) -> std::result::Result<ToolDefinition, &'static str> {
        if method.name.is_empty() {
            return Err("empty method name");
        }
        if !method
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err("method name is not a snake_case identifier");
        }
        for (i, param) in method.parameters.iter().enumerate() {
            if method.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err("duplicate parameter name");
            }
        }

        let name = format!("{}_{}", connector.name(), method.name);
        let description = if method.description.is_empty() {
            format!(
                "Call the '{}' method of the {} connector",
                method.name,
                connector.name()
            )
        } else {
            // Only the first documentation line goes to the model
            method
                .description
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        };

        Ok(ToolDefinition::new(
            name,
            description,
            connector.category(),
            ToolHandler::Method {
                method: method.name.clone(),
            },
        )
        .with_parameters(method.parameters.clone())
        .with_method_name(&method.name))
    }
}

/// Manually construct a tool backed by a plain function
pub fn create_tool<F>(
    name: impl Into<String>,
    description: impl Into<String>,
    category: ToolCategory,
    parameters: Vec<ToolParameter>,
    handler: F,
) -> ToolDefinition
where
    F: Fn(&serde_json::Value) -> Result<ToolResult> + Send + Sync + 'static,
{
    ToolDefinition::new(name, description, category, ToolHandler::from_fn(handler))
        .with_parameters(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct StubConnector {
        methods: Vec<MethodSpec>,
    }

    #[async_trait]
    impl VendorConnector for StubConnector {
        fn name(&self) -> &str {
            "stub"
        }

        fn category(&self) -> ToolCategory {
            ToolCategory::Utility
        }

        fn methods(&self) -> Vec<MethodSpec> {
            self.methods.clone()
        }

        async fn call(&self, _method: &str, args: &Value) -> Result<ToolResult> {
            Ok(ToolResult::ok(args.clone()))
        }
    }

    fn stub_with(methods: Vec<MethodSpec>) -> StubConnector {
        StubConnector { methods }
    }

    #[test]
    fn test_from_connector_prefixes_names() {
        let connector = stub_with(vec![
            MethodSpec::new("list_things", "List all things"),
            MethodSpec::new("get_thing", "Get one thing"),
        ]);

        let tools = ToolFactory::new().from_connector(&connector, None);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["stub_list_things", "stub_get_thing"]);
    }

    #[test]
    fn test_generated_tool_shape() {
        let connector = stub_with(vec![
            MethodSpec::new("list_things", "List all things\n\nLonger detail paragraph.")
                .with_parameters(vec![
                    ToolParameter::string("kind", "Kind of thing"),
                    ToolParameter::number("limit", "Max results").optional(json!(10)),
                ]),
        ]);

        let tools = ToolFactory::new().from_connector(&connector, None);
        let tool = &tools[0];

        // Only the first documentation line is kept
        assert_eq!(tool.description, "List all things");
        assert_eq!(tool.category, ToolCategory::Utility);
        assert_eq!(tool.method_name.as_deref(), Some("list_things"));
        assert_eq!(tool.parameters.len(), 2);
        assert!(matches!(&tool.handler, ToolHandler::Method { method } if method == "list_things"));
    }

    #[test]
    fn test_placeholder_description() {
        let connector = stub_with(vec![MethodSpec::new("undocumented", "")]);

        let tools = ToolFactory::new().from_connector(&connector, None);
        assert_eq!(
            tools[0].description,
            "Call the 'undocumented' method of the stub connector"
        );
    }

    #[test]
    fn test_method_filter() {
        let connector = stub_with(vec![
            MethodSpec::new("keep_me", "Kept"),
            MethodSpec::new("drop_me", "Dropped"),
        ]);

        let filter = |name: &str| name.starts_with("keep");
        let tools = ToolFactory::new().from_connector(&connector, Some(&filter));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "stub_keep_me");
    }

    #[test]
    fn test_invalid_method_skipped_not_fatal() {
        let connector = stub_with(vec![
            MethodSpec::new("Bad-Name", "Invalid identifier"),
            MethodSpec::new("good_name", "Fine"),
        ]);

        let tools = ToolFactory::new().from_connector(&connector, None);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "stub_good_name");
    }

    #[test]
    fn test_duplicate_parameter_skipped() {
        let connector = stub_with(vec![
            MethodSpec::new("dupe_params", "Has a duplicate parameter").with_parameters(vec![
                ToolParameter::string("x", "First"),
                ToolParameter::string("x", "Second"),
            ]),
        ]);

        let tools = ToolFactory::new().from_connector(&connector, None);
        assert!(tools.is_empty());
    }

    #[test]
    fn test_create_tool() {
        let tool = create_tool(
            "echo",
            "Echo the input back",
            ToolCategory::Utility,
            vec![ToolParameter::string("text", "Text to echo")],
            |args| Ok(ToolResult::ok(json!({"echo": args["text"]}))),
        );

        assert_eq!(tool.name, "echo");
        assert_eq!(tool.parameters.len(), 1);
        assert!(matches!(tool.handler, ToolHandler::Func(_)));
    }
}
