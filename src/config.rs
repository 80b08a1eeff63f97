//! Application configuration.
//!
//! Loaded from `{data_path}/concierge.toml` with env-var fallbacks, then
//! defaults. Service sections are optional; a missing section means the
//! corresponding feature reports itself unavailable instead of failing at
//! startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_session_idle_hours() -> i64 {
    12
}

fn default_namespace() -> String {
    "concierge".to_string()
}

fn default_database_name() -> String {
    "assistant".to_string()
}

/// Where the store lives. A `[database]` section of `concierge.toml` like
/// every other concern; absent, the store is an embedded RocksDB under the
/// data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// Embedded RocksDB. Single-process access.
    Embedded {
        /// Overrides the RocksDB location (defaults to the data path).
        #[serde(default)]
        path: Option<String>,
    },
    /// Remote SurrealDB over WebSocket. Supports concurrent access.
    Remote {
        /// WebSocket endpoint, e.g. `ws://127.0.0.1:8000`
        endpoint: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_namespace")]
        namespace: String,
        #[serde(default = "default_database_name")]
        database: String,
    },
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::Embedded { path: None }
    }
}

/// Text-completion service configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL, e.g. `https://api.openai.com`
    pub base_url: String,
    /// API key (can also be set via `CONCIERGE_COMPLETION_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

/// Image-generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_image_size")]
    pub size: String,
}

/// Outbound messaging dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Dispatch endpoint that accepts `{destination, body}` JSON
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub completion: Option<CompletionConfig>,
    #[serde(default)]
    pub image: Option<ImageConfig>,
    #[serde(default)]
    pub messaging: Option<MessagingConfig>,
    /// Handoff sweep interval in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Idle window for resuming the latest session instead of opening a new one.
    #[serde(default = "default_session_idle_hours")]
    pub session_idle_hours: i64,
}

/// Load application config with priority:
/// 1. `{data_path}/concierge.toml` file
/// 2. env vars for completion and database settings
/// 3. defaults (embedded store, all services unconfigured)
pub fn load_app_config(data_path: &Path) -> AppConfig {
    let mut config = AppConfig::default();

    let config_path = data_path.join("concierge.toml");
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(parsed) => {
                    tracing::info!("Loaded config from {}", config_path.display());
                    config = parsed;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
            }
        }
    }

    // Env vars fill in credentials without requiring a config file.
    if let Ok(url) = std::env::var("CONCIERGE_COMPLETION_URL") {
        let key = std::env::var("CONCIERGE_COMPLETION_KEY").ok();
        match config.completion.as_mut() {
            Some(c) => {
                if c.api_key.is_none() {
                    c.api_key = key;
                }
            }
            None => {
                config.completion = Some(CompletionConfig {
                    base_url: url,
                    api_key: key,
                    model: default_completion_model(),
                    embedding_model: default_embedding_model(),
                });
            }
        }
    } else if let (Some(c), Ok(key)) = (
        config.completion.as_mut(),
        std::env::var("CONCIERGE_COMPLETION_KEY"),
    ) {
        if c.api_key.is_none() {
            c.api_key = Some(key);
        }
    }

    // CONCIERGE_DB_URL switches to a remote store unless the file already
    // chose one; credentials follow the same file-over-env priority.
    if matches!(config.database, DatabaseConfig::Embedded { path: None }) {
        if let Ok(endpoint) = std::env::var("CONCIERGE_DB_URL") {
            config.database = DatabaseConfig::Remote {
                endpoint,
                username: None,
                password: None,
                namespace: default_namespace(),
                database: default_database_name(),
            };
        }
    }
    if let DatabaseConfig::Remote {
        username, password, ..
    } = &mut config.database
    {
        if username.is_none() {
            *username = std::env::var("CONCIERGE_DB_USER").ok();
        }
        if password.is_none() {
            *password = std::env::var("CONCIERGE_DB_PASS").ok();
        }
    }

    config
}
