use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ModelName;

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
    pub artifacts: ArtifactConfig,
    pub dataset: DatasetConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let artifacts = ArtifactConfig {
            root: PathBuf::from(
                env::var("ARTIFACTS_DIR").unwrap_or_else(|_| "artifacts".to_string()),
            ),
            exclude: parse_exclude(&env::var("ARTIFACTS_EXCLUDE").unwrap_or_default())?,
        };

        let dataset = DatasetConfig {
            domain: env::var("DATASET_DOMAIN").unwrap_or_else(|_| "www.datos.gov.co".to_string()),
            dataset_id: env::var("DATASET_ID").unwrap_or_else(|_| "dyjp-uwwh".to_string()),
            limit: parse_number("DATASET_LIMIT", 1000)?,
            timeout: Duration::from_secs(parse_number("DATASET_TIMEOUT_SECS", 30)?),
            app_token: env::var("DATASET_APP_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            artifacts,
            dataset,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

fn parse_exclude(value: &str) -> Result<Vec<ModelName>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            ModelName::parse(name).map_err(|_| ConfigError::UnknownModel {
                name: name.to_string(),
            })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the fitted model and encoder files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    pub root: PathBuf,
    /// Models skipped at load, e.g. on hosts too small for the forest.
    pub exclude: Vec<ModelName>,
}

impl ArtifactConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: Vec::new(),
        }
    }
}

/// Open-data endpoint serving the victims registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub domain: String,
    pub dataset_id: String,
    pub limit: usize,
    pub timeout: Duration,
    pub app_token: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    UnknownModel { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative integer")
            }
            ConfigError::UnknownModel { name } => {
                write!(f, "ARTIFACTS_EXCLUDE names unknown model '{name}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::UnknownModel { .. } => None,
        }
    }
}
