//! Tool System
//!
//! Tools served by the worker. Each tool advertises a descriptor (name,
//! JSON Schema, description) and executes against the raw argument map.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use agent_core::tool::{ToolArguments, ToolDescriptor, ToolOutput};

use crate::error::{Result, WorkerError};

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor advertised in `tools/list`
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolOutput>;

    /// Validate arguments before execution.
    ///
    /// Checks the `required` list of the input schema.
    fn validate(&self, arguments: &ToolArguments) -> Result<()> {
        let descriptor = self.descriptor();
        let required = descriptor
            .input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str());

        for name in required {
            if !arguments.contains_key(name) {
                return Err(WorkerError::MissingArgument(name.to_string()));
            }
        }

        Ok(())
    }
}

/// Registry for served tools, listed in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.descriptor().name;
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// Execute a tool call.
    ///
    /// Argument and domain errors come back as an error envelope so the
    /// caller sees them as a failed call; an unknown name is an `Err`.
    pub async fn execute(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| WorkerError::UnknownTool(name.to_string()))?;

        let outcome = match tool.validate(arguments) {
            Ok(()) => tool.execute(arguments).await,
            Err(e) => Err(e),
        };

        Ok(outcome.unwrap_or_else(|e| {
            tracing::warn!(tool = name, "Tool failed: {}", e);
            ToolOutput::error(e.to_string())
        }))
    }

    /// Descriptors for `tools/list`
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Read a required string argument
pub fn string_arg<'a>(arguments: &'a ToolArguments, name: &str) -> Result<&'a str> {
    let value = arguments
        .get(name)
        .ok_or_else(|| WorkerError::MissingArgument(name.to_string()))?;
    let text = value
        .as_str()
        .ok_or_else(|| WorkerError::invalid(name, "expected a string"))?
        .trim();
    if text.is_empty() {
        return Err(WorkerError::invalid(name, "must not be empty"));
    }
    Ok(text)
}
