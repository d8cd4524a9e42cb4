//! Server configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables, each layer overriding the one before.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use bulls_cows_core::{Alphabet, CodeRules};
use chrono::TimeDelta;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ServerConfig::addr`].
pub const ENV_ADDR: &str = "API_ADDR";
/// Environment variable overriding [`ServerConfig::room_ttl_secs`].
pub const ENV_ROOM_TTL: &str = "ROOM_TTL_SECS";
/// Environment variable overriding [`ServerConfig::purge_interval_secs`].
pub const ENV_PURGE_INTERVAL: &str = "PURGE_INTERVAL_SECS";
/// Environment variable overriding [`ServerConfig::graceful_timeout_secs`].
pub const ENV_GRACEFUL_TIMEOUT: &str = "GRACEFUL_TIMEOUT_SECS";
/// Environment variable overriding [`ServerConfig::alphabet`].
pub const ENV_ALPHABET: &str = "CODE_ALPHABET";
/// Environment variable overriding [`ServerConfig::allowed_origin`].
pub const ENV_ALLOWED_HOST: &str = "ALLOWED_HOST";
/// Environment variable overriding [`ServerConfig::request_timeout_secs`].
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT_SECS";

/// Longest room lifetime accepted, thirty days.
pub const MAX_ROOM_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration for the HTTP match server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on.
    addr: SocketAddr,

    /// Seconds a room lives after creation or restart.
    room_ttl_secs: u64,

    /// Seconds between sweeps of expired rooms.
    purge_interval_secs: u64,

    /// Seconds in-flight requests get to finish on shutdown.
    graceful_timeout_secs: u64,

    /// Symbols allowed in secrets and guesses.
    alphabet: Alphabet,

    /// Browser origin allowed to call the API, `*` for any. Unset allows none.
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_origin: Option<String>,

    /// Seconds a single request may take before it is answered with 408.
    request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            room_ttl_secs: 3600,
            purge_interval_secs: 60,
            graceful_timeout_secs: 10,
            alphabet: Alphabet::Digits,
            allowed_origin: None,
            request_timeout_secs: 15,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(addr = %config.addr, "Config file loaded");
        Ok(config)
    }

    /// Applies overrides found through `lookup`, keyed by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value.
    #[instrument(skip_all)]
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ADDR) {
            self.addr = parse_var(ENV_ADDR, &value)?;
        }
        if let Some(value) = lookup(ENV_ROOM_TTL) {
            self.room_ttl_secs = parse_var(ENV_ROOM_TTL, &value)?;
        }
        if let Some(value) = lookup(ENV_PURGE_INTERVAL) {
            self.purge_interval_secs = parse_var(ENV_PURGE_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_GRACEFUL_TIMEOUT) {
            self.graceful_timeout_secs = parse_var(ENV_GRACEFUL_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_ALPHABET) {
            self.alphabet = parse_var(ENV_ALPHABET, &value)?;
        }
        if let Some(value) = lookup(ENV_ALLOWED_HOST) {
            let value = value.trim();
            self.allowed_origin = (!value.is_empty()).then(|| value.to_string());
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = parse_var(ENV_REQUEST_TIMEOUT, &value)?;
        }
        Ok(self)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Builds the full configuration: defaults, then `path` if given, then
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any layer fails to load or the result is
    /// invalid.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env()?.validated()
    }

    /// Replaces the listen address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Checks that every interval is usable and the origin is a valid header.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero purge interval or request timeout, a
    /// room lifetime outside `1..=MAX_ROOM_TTL_SECS`, or an origin that cannot
    /// be sent as a header value.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.purge_interval_secs == 0 {
            return Err(ConfigError::new(format!(
                "{} must be at least 1",
                ENV_PURGE_INTERVAL
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::new(format!(
                "{} must be at least 1",
                ENV_REQUEST_TIMEOUT
            )));
        }
        if !(1..=MAX_ROOM_TTL_SECS).contains(&self.room_ttl_secs) {
            return Err(ConfigError::new(format!(
                "{} must be between 1 and {}, got {}",
                ENV_ROOM_TTL, MAX_ROOM_TTL_SECS, self.room_ttl_secs
            )));
        }
        if let Some(origin) = self
            .allowed_origin
            .as_deref()
            .filter(|origin| HeaderValue::from_str(origin).is_err())
        {
            return Err(ConfigError::new(format!(
                "{} is not a valid origin: {}",
                ENV_ALLOWED_HOST, origin
            )));
        }
        Ok(self)
    }

    /// Room lifetime as a calendar duration.
    pub fn room_ttl(&self) -> TimeDelta {
        i64::try_from(self.room_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Interval between expiry sweeps.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Time allowed for in-flight requests on shutdown.
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }

    /// Longest time a single request may take.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Code rules for the configured alphabet.
    pub fn code_rules(&self) -> CodeRules {
        CodeRules::new(self.alphabet)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::new(format!("Invalid {}='{}': {}", name, value, e)))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
