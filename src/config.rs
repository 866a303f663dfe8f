//! Connection and pipeline configuration

use crate::error::{Error, Result};
use serde::Serialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// A `host:port` pair naming one IMAP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse a `host:port` string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless the input has exactly one colon
    /// with a non-empty host before it and a valid port after it.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let [host, port] = parts.as_slice() else {
            return Err(Error::Config(format!("Malformed address: {s}")));
        };
        if host.is_empty() {
            return Err(Error::Config(format!("Malformed address: {s}")));
        }
        let port = port
            .parse()
            .map_err(|e| Error::Config(format!("Invalid port in {s}: {e}")))?;
        Ok(Self {
            host: (*host).to_string(),
            port,
        })
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How the transport is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// TLS from the first byte (IMAPS, usually port 993).
    #[default]
    Tls,
    /// Plain TCP upgraded with `STARTTLS`.
    StartTls,
}

impl FromStr for Security {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tls" | "ssl" | "imaps" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            other => Err(Error::Config(format!("Unknown security mode: {other}"))),
        }
    }
}

/// IMAP connection configuration for one side of a run
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: Security,
    /// Skip certificate verification (self-signed bridges, test servers).
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Load credentials for `endpoint` from environment variables
    ///
    /// Reads from `.env` file if present. With `prefix = "SOURCE"`,
    /// required variables are:
    /// - `SOURCE_USERNAME`
    /// - `SOURCE_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `SOURCE_SECURITY` (`tls` or `starttls`, default: `tls`)
    /// - `SOURCE_ACCEPT_INVALID_CERTS` (default: `false`)
    pub fn from_env(prefix: &str, endpoint: &Endpoint) -> Result<Self> {
        dotenvy::dotenv().ok();

        let var = |name: &str| env::var(format!("{prefix}_{name}"));

        Ok(Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            username: var("USERNAME")
                .map_err(|_| Error::Config(format!("{prefix}_USERNAME not set")))?,
            password: var("PASSWORD")
                .map_err(|_| Error::Config(format!("{prefix}_PASSWORD not set")))?,
            security: var("SECURITY").map_or(Ok(Security::default()), |s| s.parse())?,
            accept_invalid_certs: var("ACCEPT_INVALID_CERTS")
                .is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        })
    }
}

/// What a multi-item run does after one item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next item.
    #[default]
    Continue,
    /// Stop the run at the first failure.
    Abort,
}

/// What happens to staged messages of a job that aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StagingCleanup {
    /// Leave the staging directory on disk for inspection.
    #[default]
    Keep,
    /// Delete the staging directory.
    Remove,
}
