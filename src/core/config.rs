/// Server Configuration
///
/// All settings come from environment variables:
/// - SERVER_NAME: Name reported in initialize responses (default: "mcp-tool-server")
/// - SERVER_VERSION: Version string (default: the crate version)
/// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "http")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 8080)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
/// - SHUTDOWN_TIMEOUT_SECS: Grace period for in-flight calls on shutdown (default: 30)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid transport mode '{0}'. Must be 'stdio', 'http', or 'both'")]
    TransportMode(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            _ => Err(ConfigError::TransportMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-tool-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            transport: TransportMode::Http,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            workers: default_workers(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let transport = match lookup("MCP_TRANSPORT_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.transport,
        };
        let workers = match parse_var(&lookup, "WORKER_THREADS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "WORKER_THREADS",
                    value: "0".to_string(),
                });
            }
            Some(n) => n,
            None => defaults.workers,
        };

        Ok(Self {
            name: lookup("SERVER_NAME").unwrap_or(defaults.name),
            version: lookup("SERVER_VERSION").unwrap_or(defaults.version),
            transport,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            workers,
            shutdown_timeout: parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        })
        .transpose()
}

/// CPU count, capped at 16 to avoid excessive context switching.
fn default_workers() -> usize {
    num_cpus::get().clamp(1, 16)
}
