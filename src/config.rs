//! Guard configuration
//!
//! A [`GuardConfig`] is built once per server and shared read-only by every
//! request. It can come from serde input (JSON), from environment variables,
//! or be assembled with the builder methods.
//!
//! # Environment Variables
//!
//! - `DEVHOST_GUARD_HOSTS`: `all`, or a comma-separated list of patterns
//! - `DEVHOST_GUARD_SERVER_HOST`: hostname the server is bound to
//! - `DEVHOST_GUARD_REJECT_STATUS`: `400` (default) or `403`
//!
//! # Example
//!
//! ```rust
//! use devhost_guard::config::{GuardConfig, RejectStatus};
//! use devhost_guard::policy::AllowPolicy;
//!
//! let config = GuardConfig::new()
//!     .with_hosts(AllowPolicy::list([".acme.com"]).unwrap())
//!     .with_server_host("dev.internal")
//!     .with_reject_status(RejectStatus::Forbidden);
//!
//! assert!(config.is_allowed(Some("api.acme.com:5173")));
//! assert!(config.is_allowed(Some("dev.internal")));
//! assert!(!config.is_allowed(Some("evil.com")));
//! ```

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, Result};
use crate::host::classify;
use crate::policy::{evaluate, AllowPolicy, Decision, ServerIdentity, ALLOW_ALL_KEYWORD};

/// Allowed hosts variable
pub const ENV_HOSTS: &str = "DEVHOST_GUARD_HOSTS";

/// Server bind hostname variable
pub const ENV_SERVER_HOST: &str = "DEVHOST_GUARD_SERVER_HOST";

/// Rejection status variable
pub const ENV_REJECT_STATUS: &str = "DEVHOST_GUARD_REJECT_STATUS";

/// Body sent with every rejection
pub const REJECTION_BODY: &str = "Invalid Host header";

// =============================================================================
// Rejection Status
// =============================================================================

/// HTTP status used when a host is denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RejectStatus {
    /// 400 Bad Request
    #[default]
    BadRequest,
    /// 403 Forbidden
    Forbidden,
}

impl RejectStatus {
    /// The HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RejectStatus::BadRequest => StatusCode::BAD_REQUEST,
            RejectStatus::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl TryFrom<u16> for RejectStatus {
    type Error = ConfigError;

    fn try_from(code: u16) -> std::result::Result<Self, Self::Error> {
        match code {
            400 => Ok(RejectStatus::BadRequest),
            403 => Ok(RejectStatus::Forbidden),
            other => Err(ConfigError::InvalidRejectStatus(other.to_string())),
        }
    }
}

impl From<RejectStatus> for u16 {
    fn from(status: RejectStatus) -> Self {
        status.status_code().as_u16()
    }
}

impl FromStr for RejectStatus {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidRejectStatus(s.to_string()))
            .and_then(RejectStatus::try_from)
    }
}

impl fmt::Display for RejectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

// =============================================================================
// Guard Configuration
// =============================================================================

/// Immutable configuration for the host guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Allow policy (`hosts` option)
    pub hosts: AllowPolicy,

    /// Hostname the server is bound to; always allowed
    pub server_host: ServerIdentity,

    /// Status used for rejections
    pub reject_status: RejectStatus,
}

impl GuardConfig {
    /// Default configuration: no explicit hosts, no server identity, 400 on reject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allow policy.
    pub fn with_hosts(mut self, hosts: AllowPolicy) -> Self {
        self.hosts = hosts;
        self
    }

    /// Set the server bind hostname.
    pub fn with_server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = ServerIdentity::new(host);
        self
    }

    /// Set the rejection status.
    pub fn with_reject_status(mut self, status: RejectStatus) -> Self {
        self.reject_status = status;
        self
    }

    /// Parse a JSON configuration document.
    ///
    /// ```rust
    /// use devhost_guard::config::GuardConfig;
    ///
    /// let config = GuardConfig::from_json(r#"{"hosts": ".acme.com", "reject_status": 403}"#).unwrap();
    /// assert!(config.is_allowed(Some("acme.com")));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is not valid unicode, a pattern
    /// is malformed, or the rejection status is not 400/403.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
                name,
                reason: "value is not valid unicode".to_string(),
            }),
        })
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> std::result::Result<Option<String>, ConfigError>,
    {
        let hosts = match lookup(ENV_HOSTS)? {
            Some(value) => parse_hosts_list(&value)?,
            None => AllowPolicy::Empty,
        };

        let server_host = ServerIdentity::from(lookup(ENV_SERVER_HOST)?);

        let reject_status = match lookup(ENV_REJECT_STATUS)? {
            Some(value) => value.parse()?,
            None => RejectStatus::default(),
        };

        Ok(Self {
            hosts,
            server_host,
            reject_status,
        })
    }

    /// Log what the guard will accept.
    pub fn log_summary(&self) {
        match &self.hosts {
            AllowPolicy::All => {
                warn!("SECURITY: Host header checking disabled (hosts = \"all\")");
            }
            AllowPolicy::Empty => {
                info!("Host guard: localhost, IP literals and server host only");
            }
            AllowPolicy::List(patterns) => {
                info!("Host guard: {} allowed host pattern(s)", patterns.len());
            }
        }
        if let Some(host) = self.server_host.host() {
            info!("Host guard: server host {} is implicitly allowed", host);
        }
    }

    /// Evaluate a raw `Host` header against this configuration.
    pub fn decide(&self, host_header: Option<&str>) -> Decision {
        evaluate(&classify(host_header), &self.hosts, &self.server_host)
    }

    /// Whether a raw `Host` header is allowed.
    pub fn is_allowed(&self, host_header: Option<&str>) -> bool {
        self.decide(host_header).is_allowed()
    }
}

/// Parse a comma-separated hosts list as used by the environment and CLI.
///
/// `all` disables checking; blank input means no explicit hosts.
pub fn parse_hosts_list(value: &str) -> std::result::Result<AllowPolicy, ConfigError> {
    let value = value.trim();
    if value == ALLOW_ALL_KEYWORD {
        return Ok(AllowPolicy::All);
    }

    AllowPolicy::list(value.split(',').map(str::trim).filter(|p| !p.is_empty()))
}
