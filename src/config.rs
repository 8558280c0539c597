//! Server and client configuration

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6543;

/// Configuration for the spool server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub spool_dir: PathBuf,
    /// Per-line read deadline; `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Configuration with default host and port, no idle timeout.
    #[must_use]
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            spool_dir: spool_dir.into(),
            idle_timeout: None,
        }
    }

    /// Load server configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `MAILSPOOL_DIR`
    ///
    /// Optional (with defaults):
    /// - `MAILSPOOL_HOST` (default: `127.0.0.1`)
    /// - `MAILSPOOL_PORT` (default: `6543`)
    /// - `MAILSPOOL_IDLE_TIMEOUT` in seconds (default: unset, `0` disables)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `MAILSPOOL_DIR` is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let spool_dir = env::var("MAILSPOOL_DIR")
            .map_err(|_| Error::Config("MAILSPOOL_DIR not set".into()))?;
        Self::from_env_with_spool(spool_dir)
    }

    /// Like [`ServerConfig::from_env`], but with the spool root supplied
    /// by the caller (e.g. from the command line).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value cannot be parsed.
    pub fn from_env_with_spool(spool_dir: impl Into<PathBuf>) -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("MAILSPOOL_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: port_from_env()?,
            spool_dir: spool_dir.into(),
            idle_timeout: idle_timeout_from_env()?,
        })
    }
}

/// Configuration for [`SpoolClient`](crate::SpoolClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
}

impl ClientConfig {
    /// Load client configuration from environment variables
    ///
    /// Reads from `.env` file if present. Optional (with defaults):
    /// - `MAILSPOOL_HOST` (default: `127.0.0.1`)
    /// - `MAILSPOOL_PORT` (default: `6543`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `MAILSPOOL_PORT` cannot be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("MAILSPOOL_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: port_from_env()?,
        })
    }
}

fn port_from_env() -> Result<u16> {
    let Ok(raw) = env::var("MAILSPOOL_PORT") else {
        return Ok(DEFAULT_PORT);
    };
    parse_port(&raw)
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid MAILSPOOL_PORT: {e}")))
}

fn idle_timeout_from_env() -> Result<Option<Duration>> {
    let Ok(raw) = env::var("MAILSPOOL_IDLE_TIMEOUT") else {
        return Ok(None);
    };
    parse_idle_timeout(&raw)
}

fn parse_idle_timeout(raw: &str) -> Result<Option<Duration>> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid MAILSPOOL_IDLE_TIMEOUT: {e}")))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
