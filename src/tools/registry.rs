//! Ordered, name-unique tool collection with typed lookup.

use std::sync::Arc;

use serde_json::Value;

use super::builtin::{is_llm_tool, llm_tool_schema};
use super::tool::Tool;
use crate::error::ArcheError;

/// Result of resolving a tool name from a plan.
#[derive(Clone)]
pub enum ToolLookup {
    Tool(Arc<dyn Tool>),
    /// The `llm_tool` pseudo-tool.
    DirectAnswer,
    NotFound,
}

impl std::fmt::Debug for ToolLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tool(tool) => f.debug_tuple("Tool").field(&tool.name()).finish(),
            Self::DirectAnswer => f.write_str("DirectAnswer"),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), ArcheError> {
        if self.contains(tool.name()) {
            return Err(ArcheError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Remove a tool by name, returning it if present.
    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        let index = self.tools.iter().position(|t| t.name() == name)?;
        Some(self.tools.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Resolve a planned tool name. Registered tools shadow `llm_tool`.
    pub fn lookup(&self, name: &str) -> ToolLookup {
        match self.get(name) {
            Some(tool) => ToolLookup::Tool(Arc::clone(tool)),
            None if is_llm_tool(name) => ToolLookup::DirectAnswer,
            None => ToolLookup::NotFound,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Schemas of every registered tool, preceded by `llm_tool`.
    pub fn schemas(&self) -> Vec<Value> {
        std::iter::once(llm_tool_schema())
            .chain(self.tools.iter().map(|t| t.descriptor().schema()))
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
