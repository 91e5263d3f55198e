//! Tool Catalog
//!
//! Snapshot of the tools advertised by the provider, in provider order, with
//! a name index for lookups. A refresh replaces the whole snapshot.

use std::collections::HashMap;

use crate::error::{AgentError, Result};
use crate::tool::{ToolDescriptor, ToolProvider};

#[derive(Clone, Debug, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors in provider order.
    ///
    /// A repeated name keeps its first position; the later descriptor is
    /// dropped so names stay unique.
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut catalog = Self::new();
        for tool in tools {
            if catalog.index.contains_key(&tool.name) {
                tracing::warn!(tool = %tool.name, "Duplicate tool name from provider, ignoring");
                continue;
            }
            catalog.index.insert(tool.name.clone(), catalog.tools.len());
            catalog.tools.push(tool);
        }
        catalog
    }

    /// Query the provider once and swap in the new snapshot.
    ///
    /// The stored catalog is only replaced once the listing succeeded. An
    /// empty listing still replaces it and is reported as
    /// `NoToolsAvailable` so the caller can abort the turn.
    pub async fn refresh(&mut self, provider: &dyn ToolProvider) -> Result<&Self> {
        let tools = provider.list_tools().await?;
        *self = Self::from_tools(tools);
        tracing::info!(tools = self.len(), "Tool catalog refreshed");

        if self.is_empty() {
            return Err(AgentError::NoToolsAvailable);
        }
        Ok(self)
    }

    /// Get a tool by name
    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tools in provider order
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
