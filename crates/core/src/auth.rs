// Static API key table: opaque key -> human-readable client label.
// Flat trust model: any valid key may call any tool; the label is only
// attached to requests for audit logging.

use std::collections::HashMap;

pub const API_KEYS_ENV: &str = "TOOLGATE_API_KEYS";

#[derive(Debug, Default, Clone)]
pub struct ApiKeys {
    keys: HashMap<String, String>,
}

impl ApiKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=label,key=label` pairs from `TOOLGATE_API_KEYS`.
    pub fn from_env() -> Self {
        let mut keys = Self::new();
        if let Ok(raw) = std::env::var(API_KEYS_ENV) {
            for pair in raw.split(',') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                match pair.split_once('=') {
                    Some((key, label)) if !key.is_empty() && !label.is_empty() => {
                        keys.insert(key, label);
                    }
                    _ => tracing::warn!("ignoring malformed API key entry"),
                }
            }
        }
        keys
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.keys.insert(key.into(), label.into());
    }

    /// Return the client label for a valid key.
    pub fn validate(&self, key: &str) -> Option<&str> {
        match self.keys.get(key) {
            Some(label) => {
                tracing::info!(client = %label, key = %redact(key), "API access");
                Some(label)
            }
            None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Keep only a short prefix of a key for log lines.
pub fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_returns_label_for_known_key() {
        let mut keys = ApiKeys::new();
        keys.insert("api_test_key", "Test Client");

        assert_eq!(keys.validate("api_test_key"), Some("Test Client"));
        assert_eq!(keys.validate("other"), None);
    }

    #[test]
    fn redact_keeps_short_prefix_only() {
        assert_eq!(redact("api_mcp_native_12345"), "api_mcp_***");
        assert_eq!(redact("ab"), "ab***");
    }
}
