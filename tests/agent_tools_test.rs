//! End-to-end agent tooling integration tests
//!
//! Exercises the public surface: connector-driven tool generation, registry
//! filtering, schema export, and the tool-use loop against a scripted
//! provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use vendor_connectors::agent::{AiConnector, InvokeOptions};
use vendor_connectors::connectors::VendorConnector;
use vendor_connectors::error::Result;
use vendor_connectors::llm::{
    AiProvider, AiResponse, ChatRequest, LlmProvider, StopReason, TokenUsage, ToolCallRequest,
};
use vendor_connectors::tools::{
    MethodSpec, ToolCategory, ToolParameter, ToolRegistry, ToolResult, create_tool,
};

/// Provider replaying a fixed response script
struct ScriptedProvider {
    responses: Mutex<Vec<AiResponse>>,
}

impl ScriptedProvider {
    fn new(mut responses: Vec<AiResponse>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }

    fn text(content: &str) -> AiResponse {
        AiResponse {
            content: content.to_string(),
            model: "scripted".to_string(),
            provider: AiProvider::Anthropic,
            usage: TokenUsage::new(20, 10),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
        }
    }

    fn tool_call(id: &str, name: &str, args: Value) -> AiResponse {
        AiResponse {
            content: String::new(),
            model: "scripted".to_string(),
            provider: AiProvider::Anthropic,
            usage: TokenUsage::new(20, 10),
            tool_calls: vec![ToolCallRequest::new(id, name, args)],
            stop_reason: StopReason::ToolUse,
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<AiResponse> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop()
            .expect("script exhausted"))
    }
}

/// In-memory vendor standing in for a real HTTP connector
struct FakeVendor {
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeVendor {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VendorConnector for FakeVendor {
    fn name(&self) -> &str {
        "vendor"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Utility
    }

    fn methods(&self) -> Vec<MethodSpec> {
        vec![
            MethodSpec::new("lookup", "Look up a record by key").with_parameters(vec![
                ToolParameter::string("key", "Record key"),
            ]),
            MethodSpec::new("ping", "Check vendor reachability"),
        ]
    }

    async fn call(&self, method: &str, args: &Value) -> Result<ToolResult> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), args.clone()));
        Ok(ToolResult::ok(json!({"method": method, "args": args})))
    }
}

fn connector_with(responses: Vec<AiResponse>) -> AiConnector {
    AiConnector::from_provider(Box::new(ScriptedProvider::new(responses)))
}

/// Connector methods become prefixed, schema-typed tools
#[test]
fn test_vendor_methods_become_tools() {
    let connector = connector_with(vec![]);
    let registered = connector.register_connector_tools(Arc::new(FakeVendor::new()), None);
    assert_eq!(registered, vec!["vendor_lookup", "vendor_ping"]);

    let tool = connector.registry().get("vendor_lookup").unwrap();
    assert_eq!(tool.description, "Look up a record by key");
    let schema = tool.to_anthropic_schema();
    assert_eq!(schema["input_schema"]["properties"]["key"]["type"], "string");
    assert_eq!(schema["input_schema"]["required"][0], "key");
}

/// A generated tool dispatches through the bound connector instance
#[tokio::test]
async fn test_generated_tool_dispatches_to_vendor() {
    let connector = connector_with(vec![]);
    let vendor = Arc::new(FakeVendor::new());
    connector.register_connector_tools(Arc::clone(&vendor) as Arc<dyn VendorConnector>, None);

    let result = connector
        .registry()
        .execute("vendor_lookup", &json!({"key": "abc"}))
        .await
        .unwrap();
    assert!(result.success);

    let calls = vendor.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "lookup");
    assert_eq!(calls[0].1["key"], "abc");
}

/// Category filter narrows the tools offered to the model
#[test]
fn test_category_filtering() {
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(create_tool(
            "aws_tool",
            "An AWS tool",
            ToolCategory::Aws,
            vec![],
            |args| Ok(ToolResult::ok(args.clone())),
        ))
        .unwrap();
    registry
        .register(create_tool(
            "github_tool",
            "A GitHub tool",
            ToolCategory::Github,
            vec![],
            |args| Ok(ToolResult::ok(args.clone())),
        ))
        .unwrap();

    let aws_only = registry.get_tools(Some(&[ToolCategory::Aws]), None);
    assert_eq!(aws_only.len(), 1);
    assert_eq!(aws_only[0].name, "aws_tool");

    let by_name = registry.get_tools(None, Some(&["github_tool"]));
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "github_tool");
}

/// Full loop: model asks for a tool, gets the result, answers
#[tokio::test]
async fn test_invoke_runs_tool_loop_to_completion() {
    let connector = connector_with(vec![
        ScriptedProvider::tool_call("call_1", "vendor_ping", json!({})),
        ScriptedProvider::text("Vendor is reachable"),
    ]);
    connector.register_connector_tools(Arc::new(FakeVendor::new()), None);

    let outcome = connector
        .invoke(
            "Is the vendor up?",
            InvokeOptions {
                system_prompt: Some("Answer using tools"),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.content, "Vendor is reachable");
    assert_eq!(outcome.tools_used, vec!["vendor_ping"]);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.usage.total(), 60);
    assert!(!outcome.truncated);
}

/// Tool-name restriction applies inside invoke
#[tokio::test]
async fn test_invoke_with_tool_name_filter() {
    let connector = connector_with(vec![
        ScriptedProvider::tool_call("call_1", "vendor_ping", json!({})),
        ScriptedProvider::text("Pinged"),
    ]);
    connector.register_connector_tools(Arc::new(FakeVendor::new()), None);

    let outcome = connector
        .invoke(
            "Ping it",
            InvokeOptions {
                tool_names: Some(&["vendor_ping"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.tools_used, vec!["vendor_ping"]);
}

/// With no registered tools the loop degrades to a single chat turn
#[tokio::test]
async fn test_invoke_degrades_without_tools() {
    let connector = connector_with(vec![ScriptedProvider::text("Plain answer")]);

    let outcome = connector
        .invoke("Just talk", InvokeOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.content, "Plain answer");
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.tools_used.is_empty());
}

/// Two connectors sharing one registry never collide on names
#[test]
fn test_shared_registry_across_connectors() {
    let registry = Arc::new(ToolRegistry::new());
    let first = connector_with(vec![]).with_registry(Arc::clone(&registry));
    let second = connector_with(vec![]).with_registry(Arc::clone(&registry));

    first.register_connector_tools(Arc::new(FakeVendor::new()), None);
    let again = second.register_connector_tools(Arc::new(FakeVendor::new()), None);

    // Second registration finds everything already present
    assert!(again.is_empty());
    assert_eq!(registry.len(), 2);
}

/// Unregistering restores the registry to its prior state
#[test]
fn test_register_unregister_roundtrip() {
    let connector = connector_with(vec![]);
    connector.register_connector_tools(Arc::new(FakeVendor::new()), None);
    assert_eq!(connector.list_tools(None).len(), 2);

    connector.registry().unregister("vendor_ping");
    assert_eq!(connector.list_tools(None), vec!["vendor_lookup"]);

    connector.registry().unregister("vendor_lookup");
    assert!(connector.list_tools(None).is_empty());
    assert!(connector.registry().list_categories().is_empty());
}
