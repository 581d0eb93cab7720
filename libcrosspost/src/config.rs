//! Configuration management for Crosspost

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    /// Process-level channel configuration, consulted when a vault secret is
    /// absent. Keys are credential slugs (`blog_api_url`, `twitter_bearer_token`, ...).
    #[serde(default)]
    pub channels: HashMap<String, String>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    /// Static bearer token for the inbound API. Empty means unauthenticated
    /// requests are rejected unconditionally.
    pub api_token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8087".to_string(),
            api_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Base64-encoded 32-byte AES-256-GCM key held by the operator. When
    /// absent, vault lookups resolve to nothing and every credential comes
    /// from the `channels` fallback table.
    pub key: Option<String>,
}

/// Third-party API base addresses.
///
/// Defaults point at the real platforms; tests point them at local fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub instagram_graph: String,
    pub twitter_api: String,
    pub twitter_upload: String,
    pub linkedin_api: String,
    pub medium_api: String,
    pub hashnode_gql: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            instagram_graph: "https://graph.facebook.com/v19.0".to_string(),
            twitter_api: "https://api.twitter.com".to_string(),
            twitter_upload: "https://upload.twitter.com".to_string(),
            linkedin_api: "https://api.linkedin.com".to_string(),
            medium_api: "https://api.medium.com".to_string(),
            hashnode_gql: "https://gql.hashnode.com".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/crosspost/crosspost.db".to_string(),
            },
            server: ServerConfig::default(),
            vault: VaultConfig::default(),
            channels: HashMap::new(),
            endpoints: Endpoints::default(),
        }
    }

    /// The layered process-configuration table used as credential fallback.
    ///
    /// Starts from the `[channels]` file table, then overlays
    /// `CROSSPOST_`-prefixed environment variables (`CROSSPOST_BLOG_API_URL`
    /// becomes the `blog_api_url` slug). Environment wins over file.
    pub fn channel_fallback(&self) -> HashMap<String, String> {
        let mut table = self.channels.clone();
        for (key, value) in std::env::vars() {
            if let Some(slug) = key.strip_prefix("CROSSPOST_") {
                // Reserved process variables, not channel slugs
                if matches!(slug, "CONFIG" | "LOG_FORMAT" | "LOG_LEVEL") {
                    continue;
                }
                table.insert(slug.to_lowercase(), value);
            }
        }
        table
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CROSSPOST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("crosspost").join("config.toml"))
}
