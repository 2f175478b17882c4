use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use toolgate_core::{ApiKeys, Dispatcher, Registry};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub keys: Vec<ApiKeyEntry>,
}

/// One `[[auth.keys]]` table entry: an opaque key and the client label
/// recorded in audit logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    pub key: String,
    pub label: String,
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Key table from the environment plus any config file entries.
    pub fn api_keys(&self) -> ApiKeys {
        let mut keys = ApiKeys::from_env();
        for entry in &self.auth.keys {
            keys.insert(entry.key.clone(), entry.label.clone());
        }
        keys
    }
}

/// Application state shared across handlers. Built once at startup; the
/// registry is never mutated afterwards, so concurrent reads are safe.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Dispatcher,
    pub api_keys: Arc<ApiKeys>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, api_keys: ApiKeys) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            api_keys: Arc::new(api_keys),
        }
    }
}
