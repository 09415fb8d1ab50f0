// src/services/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_registry_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct FlowletConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

impl FlowletConfig {
    /// Reads `flowlet.toml` from the working directory, falling back to
    /// defaults when the file is missing.
    pub fn load() -> Result<Self> {
        let path = Path::new("flowlet.toml");

        if !path.exists() {
            debug!("flowlet.toml not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read flowlet.toml")?;
        let config: FlowletConfig =
            toml::from_str(&content).context("Failed to parse flowlet.toml")?;

        debug!("config loaded (registry at {})", config.registry.base_url);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: FlowletConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.registry.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config: FlowletConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [registry]
            base_url = "http://10.0.0.5:3000/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.registry.base_url, "http://10.0.0.5:3000/api");
    }
}
