// Provider registration table and the process-wide registry built from it.

use crate::error::Error;
use crate::provider::ToolProvider;
use crate::types::ClientConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for one provider. Receives the discovered config and
/// resolves any provider-specific settings (credentials, endpoints) on
/// its own.
pub type ProviderFactory = fn(ClientConfig) -> Result<Arc<dyn ToolProvider>, Error>;

/// One entry in the startup-time registration table. Adding a provider
/// means adding an entry here plus a module implementing [`ToolProvider`];
/// the dispatcher never changes.
pub struct ProviderSpec {
    pub slug: &'static str,
    pub description: &'static str,
    pub factory: ProviderFactory,
}

/// Yield one enabled config per table entry.
pub fn discover(table: &[ProviderSpec]) -> Vec<ClientConfig> {
    table
        .iter()
        .map(|spec| ClientConfig::new(spec.slug, spec.description))
        .collect()
}

/// Construct a provider from its config. Any failure, including an
/// unknown slug or a factory error, is reported as a load failure for
/// that provider alone.
pub fn instantiate(
    table: &[ProviderSpec],
    config: ClientConfig,
) -> Result<Arc<dyn ToolProvider>, Error> {
    let name = config.name.clone();
    let spec = table
        .iter()
        .find(|spec| spec.slug == config.name)
        .ok_or_else(|| Error::ProviderLoad {
            name: name.clone(),
            reason: "no registered factory for this slug".to_string(),
        })?;

    (spec.factory)(config).map_err(|e| match e {
        already @ Error::ProviderLoad { .. } => already,
        other => Error::ProviderLoad {
            name,
            reason: other.to_string(),
        },
    })
}

/// Process-wide, insertion-ordered mapping from provider slug to provider
/// instance. Built once at startup and never mutated afterwards, so it is
/// safe to share via `Arc` across concurrent request handlers.
#[derive(Debug)]
pub struct Registry {
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl Registry {
    /// Discover and instantiate every enabled provider in the table.
    ///
    /// Per-provider failures are logged and that provider is skipped; the
    /// load as a whole only fails when zero providers survive.
    pub fn load_all(table: &[ProviderSpec]) -> Result<Self, Error> {
        let mut providers: Vec<Arc<dyn ToolProvider>> = Vec::new();

        for config in discover(table) {
            if !config.enabled {
                tracing::info!(provider = %config.name, "provider disabled, skipping");
                continue;
            }
            let name = config.name.clone();
            match instantiate(table, config) {
                Ok(provider) => {
                    tracing::info!(
                        provider = %name,
                        tools = provider.tools().len(),
                        "loaded provider"
                    );
                    providers.push(provider);
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "skipping provider");
                }
            }
        }

        if providers.is_empty() {
            return Err(Error::NoProviders);
        }

        let registry = Self { providers };
        registry.warn_duplicate_tools();
        Ok(registry)
    }

    /// Build a registry directly from provider instances. Used by
    /// composition code and tests.
    pub fn with_providers(providers: Vec<Arc<dyn ToolProvider>>) -> Self {
        let registry = Self { providers };
        registry.warn_duplicate_tools();
        registry
    }

    /// Providers in load order.
    pub fn providers(&self) -> &[Arc<dyn ToolProvider>] {
        &self.providers
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<dyn ToolProvider>> {
        self.providers.iter().find(|p| p.name() == slug)
    }

    /// Loaded provider slugs, in load order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    // Duplicate names across providers silently shadow at dispatch time
    // (first-registered wins); make the shadowing visible at load time.
    fn warn_duplicate_tools(&self) {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for provider in &self.providers {
            for tool in provider.tools() {
                if let Some(owner) = owners.get(tool.name.as_str()) {
                    tracing::warn!(
                        tool = %tool.name,
                        first = %owner,
                        shadowed = %provider.name(),
                        "duplicate tool name; dispatch routes to the first provider"
                    );
                } else {
                    owners.insert(&tool.name, provider.name());
                }
            }
        }
    }
}
