//! Configuration management for CLI, environment variables, and config files.

use crate::error::{TweetlineError, ValidationIssue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound accepted for any timeout value, in seconds.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Main configuration for tweetline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Request-level API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub user_agent: String,
    /// Send `Accept-Encoding: gzip` on every request
    pub accept_gzip: bool,
}

/// Connection pool settings. Timeouts are in seconds, `0` disables them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: u64,
    pub connect_timeout: u64,
}

/// Configuration for logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tweetline/{}", env!("CARGO_PKG_VERSION")),
            accept_gzip: true,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            pool_idle_timeout: 90,
            connect_timeout: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str) -> Result<T, TweetlineError> {
    val.trim()
        .parse()
        .map_err(|_| TweetlineError::InvalidArgument(format!("{} has invalid format", name)))
}

impl Config {
    pub fn from_file(path: &PathBuf) -> Result<Self, TweetlineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TweetlineError::Io(e.to_string()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| TweetlineError::Parse(e.to_string())),
            _ => toml::from_str(&content).map_err(|e| TweetlineError::Parse(e.to_string())),
        }
    }

    pub fn from_default_locations() -> Result<Self, TweetlineError> {
        let config_dirs = [
            dirs::config_dir().map(|d| d.join("tweetline/config.toml")),
            Some(PathBuf::from("/etc/tweetline/config.toml")),
            Some(PathBuf::from("./tweetline.toml")),
        ];

        for path in config_dirs.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn merge_from_env(mut self) -> Result<Self, TweetlineError> {
        if let Ok(val) = std::env::var("TWEETLINE_USER_AGENT") {
            self.api.user_agent = val;
        }
        if let Ok(val) = std::env::var("TWEETLINE_ACCEPT_GZIP") {
            self.api.accept_gzip = parse_env("TWEETLINE_ACCEPT_GZIP", &val)?;
        }
        if let Ok(val) = std::env::var("TWEETLINE_POOL_MAX_IDLE") {
            self.http.pool_max_idle_per_host = parse_env("TWEETLINE_POOL_MAX_IDLE", &val)?;
        }
        if let Ok(val) = std::env::var("TWEETLINE_POOL_IDLE_TIMEOUT") {
            self.http.pool_idle_timeout = parse_env("TWEETLINE_POOL_IDLE_TIMEOUT", &val)?;
        }
        if let Ok(val) = std::env::var("TWEETLINE_CONNECT_TIMEOUT") {
            self.http.connect_timeout = parse_env("TWEETLINE_CONNECT_TIMEOUT", &val)?;
        }
        if let Ok(val) = std::env::var("TWEETLINE_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(self)
    }

    pub fn merge_from_cli(mut self, cli: &CliArgs) -> Self {
        if let Some(ref user_agent) = cli.user_agent {
            self.api.user_agent = user_agent.clone();
        }

        if cli.no_gzip {
            self.api.accept_gzip = false;
        }

        if let Some(ref level) = cli.log_level {
            self.logging.level = level.clone();
        }

        self
    }

    pub fn load_with_cli(cli: &CliArgs) -> Result<Self, TweetlineError> {
        let base = match cli.config_file {
            Some(ref path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        Ok(base.merge_from_env()?.merge_from_cli(cli))
    }

    pub fn validate(&self) -> Result<(), TweetlineError> {
        let mut issues = Vec::new();

        if self.api.user_agent.trim().is_empty() {
            issues.push(ValidationIssue {
                field: "api.user_agent".to_string(),
                message: "User agent cannot be empty".to_string(),
            });
        } else if reqwest::header::HeaderValue::from_str(&self.api.user_agent).is_err() {
            issues.push(ValidationIssue {
                field: "api.user_agent".to_string(),
                message: "User agent is not a valid header value".to_string(),
            });
        }

        for (field, value) in [
            ("http.pool_idle_timeout", self.http.pool_idle_timeout),
            ("http.connect_timeout", self.http.connect_timeout),
        ] {
            if value > MAX_TIMEOUT_SECS {
                issues.push(ValidationIssue {
                    field: field.to_string(),
                    message: format!("Must be at most {} seconds", MAX_TIMEOUT_SECS),
                });
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            issues.push(ValidationIssue {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(TweetlineError::ValidationError(issues))
        }
    }

    /// Configured log level as a tracing level.
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

/// Command-line arguments that override configuration values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub no_gzip: bool,
    pub log_level: Option<String>,
}
