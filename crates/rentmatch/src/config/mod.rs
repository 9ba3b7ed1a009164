use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::auth::Role;

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
    pub matching: MatchingConfig,
    pub viewings: ViewingConfig,
    pub rate_limit: RateLimitConfig,
    pub sessions: Vec<SessionSeed>,
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

        let defaults = MatchingConfig::default();
        let approval_threshold =
            threshold_var("APP_MATCH_APPROVAL_THRESHOLD", defaults.approval_threshold)?;
        let digest_threshold =
            threshold_var("APP_MATCH_DIGEST_THRESHOLD", defaults.digest_threshold)?;

        let lookahead_days = numeric_var(
            "APP_SLOT_LOOKAHEAD_DAYS",
            ViewingConfig::default().lookahead_days,
        )?;

        let rate_defaults = RateLimitConfig::default();
        let max_requests = numeric_var("APP_RATE_LIMIT_MAX", rate_defaults.max_requests)?;
        let window_secs = numeric_var("APP_RATE_LIMIT_WINDOW_SECS", rate_defaults.window_secs)?;

        let sessions = match env::var("APP_SESSION_TOKENS") {
            Ok(raw) => parse_session_seeds(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            matching: MatchingConfig {
                approval_threshold,
                digest_threshold,
                ..defaults
            },
            viewings: ViewingConfig { lookahead_days },
            rate_limit: RateLimitConfig {
                max_requests,
                window_secs,
            },
            sessions,
        })
    }
}

fn numeric_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

fn threshold_var(name: &'static str, default: u8) -> Result<u8, ConfigError> {
    let value = numeric_var(name, default)?;
    if value > 100 {
        return Err(ConfigError::ThresholdOutOfRange { name, value });
    }
    Ok(value)
}

/// Parses `token:user_id:role` triples separated by commas.
pub fn parse_session_seeds(raw: &str) -> Result<Vec<SessionSeed>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let token = parts.next().unwrap_or_default().trim();
            let user_id = parts.next().unwrap_or_default().trim();
            let role = parts.next().and_then(Role::parse);

            match role {
                Some(role) if !token.is_empty() && !user_id.is_empty() => Ok(SessionSeed {
                    token: token.to_string(),
                    user_id: user_id.to_string(),
                    role,
                }),
                _ => Err(ConfigError::InvalidSessionToken {
                    entry: entry.to_string(),
                }),
            }
        })
        .collect()
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Score thresholds used by the notification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingConfig {
    pub approval_threshold: u8,
    pub digest_threshold: u8,
    pub digest_limit: usize,
    pub recommendation_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 60,
            digest_threshold: 85,
            digest_limit: 10,
            recommendation_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewingConfig {
    pub lookahead_days: u32,
}

impl Default for ViewingConfig {
    fn default() -> Self {
        Self { lookahead_days: 60 }
    }
}

/// Per IP+path request budget enforced by the rate-limit middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
        }
    }
}

/// Bearer token registered with the static session resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSeed {
    pub token: String,
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    ThresholdOutOfRange { name: &'static str, value: u8 },
    InvalidSessionToken { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::ThresholdOutOfRange { name, value } => {
                write!(f, "{name} must be between 0 and 100 (found {value})")
            }
            ConfigError::InvalidSessionToken { entry } => write!(
                f,
                "APP_SESSION_TOKENS entry '{entry}' must look like token:user_id:role"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
