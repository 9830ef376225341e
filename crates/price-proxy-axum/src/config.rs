//! Server configuration loaded from the environment

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

use price_proxy::{CoordinatorConfig, WorkerConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} has not been provided or invalid - please check the environmental variables")]
    Missing(&'static str),

    #[error(
        "{name} has not been provided or invalid - please check the environmental variables (got {value:?})"
    )]
    Invalid { name: &'static str, value: String },
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Redis endpoint shared by store, queue and bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisTarget {
    pub host: String,
    pub port: u16,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Latency injected by the simulated upstream source
    pub external_call_delay: Duration,
    /// `None` runs on the in-memory collaborators
    pub redis: Option<RedisTarget>,
    /// `None` lets lookups wait indefinitely
    pub lookup_timeout: Option<Duration>,
    pub fetch_timeout: Duration,
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    ///
    /// Required: `PORT`, `EXTERNAL_CALL_DELAY` (ms). Optional: `HOST`,
    /// `REDIS_HOSTNAME`, `REDIS_PORT`, `LOOKUP_TIMEOUT_MS` (0 disables),
    /// `FETCH_TIMEOUT_MS`, `LOG_LEVEL`, `LOG_FORMAT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_required::<u16>(&get, "PORT")?;
        let delay_ms = parse_required::<u64>(&get, "EXTERNAL_CALL_DELAY")?;

        let redis = match get("REDIS_HOSTNAME") {
            Some(host) => Some(RedisTarget {
                host,
                port: parse_optional(&get, "REDIS_PORT")?.unwrap_or(DEFAULT_REDIS_PORT),
            }),
            None => None,
        };

        let lookup_timeout_ms =
            parse_optional(&get, "LOOKUP_TIMEOUT_MS")?.unwrap_or(DEFAULT_LOOKUP_TIMEOUT_MS);
        let fetch_timeout_ms =
            parse_optional(&get, "FETCH_TIMEOUT_MS")?.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS);

        let defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: get("LOG_LEVEL").unwrap_or(defaults.level),
            format: get("LOG_FORMAT").unwrap_or(defaults.format),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            external_call_delay: Duration::from_millis(delay_ms),
            redis,
            lookup_timeout: (lookup_timeout_ms > 0)
                .then(|| Duration::from_millis(lookup_timeout_ms)),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            logging,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            wait_timeout: self.lookup_timeout,
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::default().with_fetch_timeout(self.fetch_timeout)
    }
}

fn parse_required<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<T, ConfigError> {
    parse_optional(get, name)?.ok_or(ConfigError::Missing(name))
}

fn parse_optional<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(None),
    }
}
