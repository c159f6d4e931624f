use std::{env, net::SocketAddr, time::Duration};

use crate::infrastructure::cipher::KEY_LEN as ENCRYPTION_KEY_LEN;

use super::env::{
    AnthropicConfig, AppConfig, ConfigError, DirectoryConfig, IntegrationsConfig, LoggingConfig,
    SchedulerConfig, SecurityConfig, ServerConfig, WebContentConfig,
};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_INSTAPAPER_URL: &str = "https://www.instapaper.com/api/add";
pub const DEFAULT_TODOIST_URL: &str = "https://api.todoist.com/rest/v2/tasks";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_bind = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
        let bind_addr = raw_bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw_bind.clone(),
            })?;

        let anthropic = AnthropicConfig {
            api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|v| !v.is_empty()),
            model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            api_url: env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_API_URL.to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "bookmarks.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let web = WebContentConfig {
            fetch_timeout: Duration::from_millis(parse_or("WEBPAGE_FETCH_TIMEOUT", 10_000)),
            content_max_length: parse_or("WEBPAGE_CONTENT_MAX_LENGTH", 8_000),
        };

        let integrations = IntegrationsConfig {
            instapaper_url: env::var("INSTAPAPER_API_URL")
                .unwrap_or_else(|_| DEFAULT_INSTAPAPER_URL.to_string()),
            todoist_url: env::var("TODOIST_API_URL")
                .unwrap_or_else(|_| DEFAULT_TODOIST_URL.to_string()),
        };

        let server = ServerConfig {
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|value| parse_origins(&value))
                .unwrap_or_default(),
            registration_disabled: env::var("DISABLE_REGISTRATION")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        let scheduler = SchedulerConfig {
            rate_limit_sweep_cron: env::var("RATE_LIMIT_SWEEP_CRON")
                .unwrap_or_else(|_| "0 * * * * *".to_string()),
        };

        let encryption_key = env::var("ENCRYPTION_KEY").ok().filter(|v| !v.is_empty());
        if let Some(key) = &encryption_key {
            validate_encryption_key(key)?;
        }
        let security = SecurityConfig { encryption_key };

        Ok(Self {
            bind_addr,
            anthropic,
            directories,
            logging,
            web,
            integrations,
            server,
            scheduler,
            security,
        })
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            anthropic: AnthropicConfig {
                api_key: Some("test-key".to_string()),
                model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                api_url: DEFAULT_ANTHROPIC_API_URL.to_string(),
            },
            directories: DirectoryConfig {
                logs_dir: "logs".to_string(),
                data_dir: "data".to_string(),
                db_filename: "bookmarks.db".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            web: WebContentConfig {
                fetch_timeout: Duration::from_secs(5),
                content_max_length: 8_000,
            },
            integrations: IntegrationsConfig {
                instapaper_url: DEFAULT_INSTAPAPER_URL.to_string(),
                todoist_url: DEFAULT_TODOIST_URL.to_string(),
            },
            server: ServerConfig {
                cors_allowed_origins: Vec::new(),
                registration_disabled: false,
            },
            scheduler: SchedulerConfig {
                rate_limit_sweep_cron: "0 * * * * *".to_string(),
            },
            security: SecurityConfig {
                encryption_key: Some("0123456789abcdef0123456789abcdef".to_string()),
            },
        }
    }
}

/// The key itself never appears in the error.
fn validate_encryption_key(key: &str) -> Result<(), ConfigError> {
    if key.len() == ENCRYPTION_KEY_LEN {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key: "ENCRYPTION_KEY",
            value: format!("{} bytes, expected {ENCRYPTION_KEY_LEN}", key.len()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

/// `*` anywhere in the list collapses to "any origin".
fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_wildcard_means_any() {
        assert_eq!(
            parse_origins(" https://a.example , https://b.example,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origins("https://a.example,*").is_empty());
    }

    #[test]
    fn encryption_key_length_is_checked_without_echoing_it() {
        assert!(validate_encryption_key("0123456789abcdef0123456789abcdef").is_ok());
        let err = validate_encryption_key("too-short-secret").unwrap_err().to_string();
        assert!(err.contains("ENCRYPTION_KEY"));
        assert!(err.contains("16 bytes"));
        assert!(!err.contains("too-short-secret"));
    }
}
