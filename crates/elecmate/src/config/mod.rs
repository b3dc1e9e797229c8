use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::workflows::pricing::{AnomalyPolicy, DEFAULT_LIST_LIMIT};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = AnomalyPolicy::default();
        let list_limit = parse_var("APP_PRICING_LIST_LIMIT", DEFAULT_LIST_LIMIT)?;
        let minimum_samples = parse_var("APP_PRICING_MIN_SAMPLES", defaults.minimum_samples)?;
        let deviation_threshold = parse_var(
            "APP_PRICING_DEVIATION_THRESHOLD",
            defaults.deviation_threshold,
        )?;
        if list_limit == 0 {
            return Err(ConfigError::OutOfRange {
                key: "APP_PRICING_LIST_LIMIT",
                value: list_limit.to_string(),
                expected: "at least 1",
            });
        }
        if minimum_samples == 0 {
            return Err(ConfigError::OutOfRange {
                key: "APP_PRICING_MIN_SAMPLES",
                value: minimum_samples.to_string(),
                expected: "at least 1",
            });
        }
        // High needs room below the Very High cut-off.
        if !deviation_threshold.is_finite()
            || deviation_threshold <= 0.0
            || deviation_threshold >= defaults.very_high_threshold
        {
            return Err(ConfigError::OutOfRange {
                key: "APP_PRICING_DEVIATION_THRESHOLD",
                value: deviation_threshold.to_string(),
                expected: "a number above 0 and below 1",
            });
        }

        let seed_csv = env::var("APP_PRICING_SEED_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            moderation: ModerationConfig {
                list_limit,
                policy: AnomalyPolicy {
                    minimum_samples,
                    deviation_threshold,
                    ..defaults
                },
                seed_csv,
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the pricing moderation workflow.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub list_limit: usize,
    pub policy: AnomalyPolicy,
    /// Optional CSV export used to seed the in-memory store at startup.
    pub seed_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    OutOfRange {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric (got '{value}')")
            }
            ConfigError::OutOfRange {
                key,
                value,
                expected,
            } => write!(f, "{key} must be {expected} (got '{value}')"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::OutOfRange { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
