//! Exporter configuration: CLI flags, optional TOML file, defaults.
//!
//! Precedence is flag > file > default. Everything is validated once at
//! startup; an invalid value stops the process before it serves.
//!
//! ```toml
//! [twemproxy]
//! stats_address = "localhost:22222"
//! timeout = "2s"
//!
//! [web]
//! listen_address = ":9151"
//! telemetry_path = "/metrics"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_STATS_ADDRESS: &str = "localhost:22222";
pub const DEFAULT_TIMEOUT: &str = "2s";
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9151";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

/// Paths the router already serves.
const RESERVED_PATHS: [&str; 2] = ["/", "/healthz"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("invalid duration {0:?} (expected e.g. 500ms, 2s, 1m30s)")]
    InvalidDuration(String),

    #[error("invalid telemetry path {0:?}: {1}")]
    InvalidPath(String, &'static str),
}

/// Contents of the optional TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub twemproxy: TwemproxySection,
    pub web: WebSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwemproxySection {
    pub stats_address: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub stats_address: Option<String>,
    pub timeout: Option<String>,
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterConfig {
    /// `host:port` of the twemproxy stats port.
    pub stats_address: String,
    /// Per-scrape fetch timeout. Zero is passed through; the exporter
    /// replaces it with its default.
    pub timeout: Duration,
    /// `host:port` to bind, with an empty host expanded to all interfaces.
    pub listen_address: String,
    pub telemetry_path: String,
}

impl ExporterConfig {
    pub fn resolve(cli: Overrides, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let stats_address = cli
            .stats_address
            .or(file.twemproxy.stats_address)
            .unwrap_or_else(|| DEFAULT_STATS_ADDRESS.to_string());
        validate_host_port("twemproxy.stats-address", &stats_address, false)?;

        let timeout = cli
            .timeout
            .or(file.twemproxy.timeout)
            .unwrap_or_else(|| DEFAULT_TIMEOUT.to_string());
        let timeout = parse_duration(&timeout).ok_or(ConfigError::InvalidDuration(timeout))?;

        let listen_address = cli
            .listen_address
            .or(file.web.listen_address)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
        validate_host_port("web.listen-address", &listen_address, true)?;
        let listen_address = match listen_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => listen_address,
        };

        let telemetry_path = cli
            .telemetry_path
            .or(file.web.telemetry_path)
            .unwrap_or_else(|| DEFAULT_TELEMETRY_PATH.to_string());
        if !telemetry_path.starts_with('/') {
            return Err(ConfigError::InvalidPath(telemetry_path, "must start with '/'"));
        }
        if RESERVED_PATHS.contains(&telemetry_path.as_str()) {
            return Err(ConfigError::InvalidPath(telemetry_path, "path is reserved"));
        }
        if let Some(reason) = route_syntax(&telemetry_path) {
            return Err(ConfigError::InvalidPath(telemetry_path, reason));
        }

        Ok(Self {
            stats_address,
            timeout,
            listen_address,
            telemetry_path,
        })
    }
}

/// Check `value` is `host:port` with a numeric port. IPv6 hosts must be
/// bracketed (`[::1]:22222`).
fn validate_host_port(
    field: &'static str,
    value: &str,
    allow_empty_host: bool,
) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
        reason,
    };

    let (host, port) = value.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
    if host.is_empty() && !allow_empty_host {
        return Err(invalid("missing host"));
    }
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(invalid("IPv6 hosts must be bracketed"));
    }
    port.parse::<u16>().map_err(|_| invalid("port must be a number in 0-65535"))?;
    Ok(())
}

/// The telemetry path is registered as a literal route; captures,
/// wildcards and braces would change its meaning or be refused by the
/// router.
fn route_syntax(path: &str) -> Option<&'static str> {
    if path.contains(['{', '}']) {
        return Some("braces are not allowed");
    }
    path.split('/')
        .find(|segment| segment.starts_with([':', '*']))
        .map(|_| "segments must not start with ':' or '*'")
}

/// Parse a duration like "500ms", "2s", "1m30s", "250us", or bare seconds.
/// Fractions are not accepted; write "1s500ms" rather than "1.5s".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    match s.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(s).ok(),
    }
}
