// Provider trait: the uniform capability surface every tool bundle
// implements.

use crate::types::{ClientConfig, ToolDefinition, ToolResult};
use anyhow::Result;

/// A self-contained bundle of related tools exposed under one slug.
///
/// Implementations build their tool table once at construction (via
/// [`ToolSet`]) and never mutate it afterwards, so a provider behind an
/// `Arc` is safe for concurrent read-only dispatch.
#[async_trait::async_trait]
pub trait ToolProvider: Send + Sync {
    fn config(&self) -> &ClientConfig;

    /// Tool definitions in registration order.
    fn tools(&self) -> &[ToolDefinition];

    /// Execute a tool owned by this provider.
    ///
    /// Expected failures (upstream API errors, bad input values) should be
    /// returned as `Ok` results with `is_error = true`; an `Err` here is
    /// treated as an unexpected failure and converted to an error result
    /// at the dispatch boundary.
    async fn execute_tool(&self, name: &str, arguments: serde_json::Value)
        -> Result<ToolResult>;

    /// Rich help text for the `<slug>://help` resource. Providers that
    /// return `None` get a generic listing synthesized from their tools.
    fn help_text(&self) -> Option<String> {
        None
    }

    fn name(&self) -> &str {
        &self.config().name
    }

    fn description(&self) -> &str {
        &self.config().description
    }

    fn is_enabled(&self) -> bool {
        self.config().enabled
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}

impl std::fmt::Debug for dyn ToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Insertion-ordered tool table. Registering a name twice replaces the
/// earlier definition in place.
#[derive(Debug, Default)]
pub struct ToolSet {
    tools: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDefinition) {
        tracing::debug!(tool = %tool.name, "registered tool");
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name == tool.name) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn as_slice(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
