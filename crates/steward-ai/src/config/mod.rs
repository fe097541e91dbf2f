use crate::precedents::BlendMode;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub corpus: CorpusConfig,
    pub blend_mode: BlendMode,
    pub narrative: NarrativeConfig,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::Compact,
        };

        let dataset_path = env::var("STEWARD_CORPUS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/precedents.csv"));
        let tips_path = env::var("STEWARD_TIPS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/tips.txt"));

        let blend_mode = match env::var("STEWARD_BLEND_MODE") {
            Ok(raw) => raw
                .parse::<BlendMode>()
                .map_err(|_| ConfigError::InvalidBlendMode(raw))?,
            Err(_) => BlendMode::RuleBlend,
        };

        let max_attempts = numeric_var("STEWARD_NARRATIVE_MAX_ATTEMPTS", 3)?
            .clamp(1, u64::from(u32::MAX)) as u32;
        let narrative = NarrativeConfig {
            timeout: Duration::from_secs(numeric_var("STEWARD_NARRATIVE_TIMEOUT_SECS", 30)?),
            max_attempts,
            backoff: Duration::from_millis(numeric_var("STEWARD_NARRATIVE_BACKOFF_MS", 1000)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            corpus: CorpusConfig {
                dataset_path,
                tips_path,
            },
            blend_mode,
            narrative,
        })
    }
}

fn numeric_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
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
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Locations of the static reference data loaded once at startup.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub dataset_path: PathBuf,
    pub tips_path: PathBuf,
}

/// Deadline and retry policy for the external narrative provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrativeConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidBlendMode(String),
    InvalidNumber { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidBlendMode(value) => write!(
                f,
                "STEWARD_BLEND_MODE must be 'precedent' or 'rule', got '{value}'"
            ),
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::InvalidBlendMode(_)
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
