// Tool dispatch: maps an incoming tool name to the owning provider and
// executes it, normalizing every outcome into a ToolResult. Shared by the
// stdio and HTTP protocol surfaces so both report identical semantics.

use crate::error::Error;
use crate::registry::Registry;
use crate::types::{ResourceHandle, ToolDefinition, ToolResult};
use crate::ToolProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    fn enabled_providers(&self) -> impl Iterator<Item = &Arc<dyn ToolProvider>> {
        self.registry.providers().iter().filter(|p| p.is_enabled())
    }

    /// Union of tool definitions across enabled providers: provider load
    /// order, then per-provider registration order. Duplicate names are
    /// kept; only dispatch-by-name collapses to the first match.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.enabled_providers()
            .flat_map(|p| p.tools().iter().cloned())
            .collect()
    }

    /// First enabled provider that owns the named tool, in load order.
    pub fn find_tool(&self, name: &str) -> Option<Arc<dyn ToolProvider>> {
        self.enabled_providers()
            .find(|p| p.has_tool(name))
            .cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.find_tool(name).is_some()
    }

    /// Execute a tool by name. Never fails at this layer: an unknown name
    /// and a provider failure both come back as error-flagged results so
    /// the protocol loops stay up.
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> ToolResult {
        let Some(provider) = self.find_tool(name) else {
            tracing::warn!(tool = %name, "tool not found");
            return ToolResult::error(format!("Tool '{name}' not found"));
        };

        tracing::info!(tool = %name, provider = %provider.name(), "executing tool");
        match provider.execute_tool(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(tool = %name, provider = %provider.name(), error = %e, "tool execution failed");
                ToolResult::error(format!("Tool execution failed: {e}"))
            }
        }
    }

    /// One `<slug>://help` handle per enabled provider.
    pub fn list_resources(&self) -> Vec<ResourceHandle> {
        self.enabled_providers()
            .map(|p| ResourceHandle {
                uri: format!("{}://help", p.name()),
                name: format!("{} Help", capitalize(p.name())),
                description: format!("Help and usage information for {} tools", p.name()),
                mime_type: "text/plain".to_string(),
            })
            .collect()
    }

    /// Resolve a `<slug>://help` URI to its help document. Prefers the
    /// provider's own help text; otherwise synthesizes a numbered listing
    /// of its tools.
    pub fn read_resource(&self, uri: &str) -> Result<String, Error> {
        let not_found = || Error::ResourceNotFound(uri.to_string());

        let (slug, tail) = uri.split_once("://").ok_or_else(not_found)?;
        if tail != "help" {
            return Err(not_found());
        }

        let provider = self
            .registry
            .get(slug)
            .filter(|p| p.is_enabled())
            .ok_or_else(not_found)?;

        if let Some(help) = provider.help_text() {
            return Ok(help);
        }

        let mut lines = vec![
            format!("{} Assistant Help", capitalize(slug)),
            String::new(),
            "Available Tools:".to_string(),
        ];
        for (i, tool) in provider.tools().iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, tool.name));
            lines.push(format!("   - {}", tool.description));
            lines.push(String::new());
        }
        Ok(lines.join("\n"))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolSet;
    use crate::types::ClientConfig;
    use anyhow::{bail, Result as AnyResult};

    struct StubProvider {
        config: ClientConfig,
        tools: ToolSet,
        reply: String,
        help: Option<String>,
        fail: bool,
    }

    impl StubProvider {
        fn new(slug: &str, tool_names: &[&str], reply: &str) -> Self {
            let mut tools = ToolSet::new();
            for name in tool_names {
                tools.register(ToolDefinition {
                    name: name.to_string(),
                    description: format!("{name} from {slug}"),
                    input_schema: serde_json::json!({"type": "object"}),
                });
            }
            Self {
                config: ClientConfig::new(slug, format!("{slug} tools")),
                tools,
                reply: reply.to_string(),
                help: None,
                fail: false,
            }
        }

        fn with_help(mut self, help: &str) -> Self {
            self.help = Some(help.to_string());
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn disabled(mut self) -> Self {
            self.config.enabled = false;
            self
        }
    }

    #[async_trait::async_trait]
    impl ToolProvider for StubProvider {
        fn config(&self) -> &ClientConfig {
            &self.config
        }

        fn tools(&self) -> &[ToolDefinition] {
            self.tools.as_slice()
        }

        async fn execute_tool(
            &self,
            _name: &str,
            _arguments: serde_json::Value,
        ) -> AnyResult<ToolResult> {
            if self.fail {
                bail!("upstream exploded");
            }
            Ok(ToolResult::text(self.reply.clone()))
        }

        fn help_text(&self) -> Option<String> {
            self.help.clone()
        }
    }

    fn dispatcher(providers: Vec<StubProvider>) -> Dispatcher {
        let providers: Vec<Arc<dyn ToolProvider>> = providers
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn ToolProvider>)
            .collect();
        Dispatcher::new(Arc::new(Registry::with_providers(providers)))
    }

    #[tokio::test]
    async fn call_routes_to_first_provider_owning_the_name() {
        let dispatch = dispatcher(vec![
            StubProvider::new("first", &["shared"], "from first"),
            StubProvider::new("second", &["shared"], "from second"),
        ]);

        let result = dispatch.call_tool("shared", serde_json::json!({})).await;
        assert_eq!(result.first_text(), Some("from first"));
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn unknown_tool_returns_error_result_not_failure() {
        let dispatch = dispatcher(vec![StubProvider::new("a", &["x"], "ok")]);

        let result = dispatch
            .call_tool("nonexistent", serde_json::json!({}))
            .await;
        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("Tool 'nonexistent' not found"));
    }

    #[tokio::test]
    async fn provider_failure_is_contained_as_error_result() {
        let dispatch = dispatcher(vec![StubProvider::new("a", &["boom"], "ok").failing()]);

        let result = dispatch.call_tool("boom", serde_json::json!({})).await;
        assert!(result.is_error);
        assert!(result
            .first_text()
            .unwrap()
            .contains("Tool execution failed: upstream exploded"));
    }

    #[tokio::test]
    async fn disabled_providers_are_invisible_to_dispatch() {
        let dispatch = dispatcher(vec![
            StubProvider::new("off", &["hidden"], "no").disabled(),
            StubProvider::new("on", &["visible"], "yes"),
        ]);

        assert!(!dispatch.has_tool("hidden"));
        let names: Vec<_> = dispatch
            .list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["visible"]);
    }

    #[test]
    fn list_tools_keeps_duplicates_in_provider_order() {
        let dispatch = dispatcher(vec![
            StubProvider::new("first", &["shared", "only_first"], "a"),
            StubProvider::new("second", &["shared"], "b"),
        ]);

        let names: Vec<_> = dispatch
            .list_tools()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["shared", "only_first", "shared"]);
    }

    #[test]
    fn resources_follow_help_uri_pattern() {
        let dispatch = dispatcher(vec![StubProvider::new("weather", &["t"], "ok")]);

        let resources = dispatch.list_resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, "weather://help");
        assert_eq!(resources[0].name, "Weather Help");
        assert_eq!(resources[0].mime_type, "text/plain");
    }

    #[test]
    fn read_resource_prefers_provider_help_text() {
        let dispatch = dispatcher(vec![
            StubProvider::new("rich", &["t"], "ok").with_help("custom help"),
            StubProvider::new("plain", &["list_things"], "ok"),
        ]);

        assert_eq!(dispatch.read_resource("rich://help").unwrap(), "custom help");

        let generic = dispatch.read_resource("plain://help").unwrap();
        assert!(generic.starts_with("Plain Assistant Help"));
        assert!(generic.contains("1. list_things"));
    }

    #[test]
    fn read_resource_rejects_unknown_or_malformed_uris() {
        let dispatch = dispatcher(vec![StubProvider::new("a", &["t"], "ok")]);

        assert!(matches!(
            dispatch.read_resource("ghost://help"),
            Err(Error::ResourceNotFound(_))
        ));
        assert!(matches!(
            dispatch.read_resource("a://other"),
            Err(Error::ResourceNotFound(_))
        ));
        assert!(matches!(
            dispatch.read_resource("no-separator"),
            Err(Error::ResourceNotFound(_))
        ));
    }
}
