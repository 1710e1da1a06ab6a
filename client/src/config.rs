use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level client configuration, loaded from parley.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub gateway: GatewaySection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// WebSocket URL of the gateway the session connects to.
    pub url: String,
    /// Token presented during identify. Empty means unauthenticated.
    pub token: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: "wss://gateway.parley.chat".into(),
            token: String::new(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GATEWAY_URL") {
            self.gateway.url = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_TOKEN") {
            self.gateway.token = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.gateway.url, "wss://gateway.parley.chat");
        assert!(config.gateway.token.is_empty());
    }

    #[test]
    fn test_parse_partial_toml() {
        // Missing keys fall back to section defaults
        let config: ClientConfig = toml::from_str(
            r#"
            [gateway]
            url = "wss://gateway.example.test"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.url, "wss://gateway.example.test");
        assert!(config.gateway.token.is_empty());
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.url, "wss://gateway.parley.chat");
    }
}
