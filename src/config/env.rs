use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub anthropic: AnthropicConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub web: WebContentConfig,
    pub integrations: IntegrationsConfig,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct WebContentConfig {
    pub fetch_timeout: Duration,
    pub content_max_length: usize,
}

#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    pub instapaper_url: String,
    pub todoist_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub registration_disabled: bool,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub rate_limit_sweep_cron: String,
}

#[derive(Clone)]
pub struct SecurityConfig {
    /// Key for third-party credentials at rest. Exactly 32 bytes when set.
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
