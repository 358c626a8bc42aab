//! Tools the conversational agent may invoke during a call

use crate::domain::session::{ToolCall, ToolDefinition, ToolOutput};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// A callback exposed to the language model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool (e.g., "end_call").
    fn name(&self) -> &str;

    /// Description for the LLM prompt.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<ToolOutput>;
}

/// Result of dispatching one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub output: ToolOutput,
    pub is_error: bool,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Run the named tool. Failures become an error result for the model.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let outcome = match self.get(&call.name) {
            Some(tool) => tool.execute(call.arguments.clone()).await,
            None => Err(anyhow!("unknown tool '{}'", call.name)),
        };

        match outcome {
            Ok(output) => ToolResult {
                output,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, "tool call failed: {:#}", e);
                ToolResult {
                    output: ToolOutput::Text(format!("{:#}", e)),
                    is_error: true,
                }
            }
        }
    }
}

/// Read a required string argument
pub fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing '{}' argument", name))
}
