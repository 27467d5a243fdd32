//! Tool System - schema types, registry, and declarative generation

mod factory;
mod registry;
mod types;

pub use factory::{MethodSpec, ToolFactory, create_tool};
pub use registry::ToolRegistry;
pub use types::{
    HandlerFn, ParameterKind, ToolCategory, ToolDefinition, ToolHandler, ToolParameter, ToolResult,
};
