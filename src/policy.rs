//! Allow policy and host decision
//!
//! Decides whether a [`ClassifiedHost`] may reach the development server.
//! Rules are evaluated in a fixed order and the first one that fires wins:
//!
//! 1. `hosts: "all"` allows everything, including invalid headers
//! 2. invalid headers are denied
//! 3. `file:` and `*-extension:` values are allowed
//! 4. `localhost` and its loopback variants, plus `*.localhost`, are allowed
//! 5. the server's own bind hostname is allowed
//! 6. IPv4 and IPv6 literals are allowed
//! 7. hostnames matching a configured pattern are allowed
//! 8. everything else is denied
//!
//! # Example
//!
//! ```rust
//! use devhost_guard::host::classify_str;
//! use devhost_guard::policy::{is_allowed, AllowPolicy, ServerIdentity};
//!
//! let policy = AllowPolicy::list([".acme.com"]).unwrap();
//! let identity = ServerIdentity::none();
//!
//! assert!(is_allowed(&classify_str("sub.acme.com:5173"), &policy, &identity));
//! assert!(!is_allowed(&classify_str("fooacme.com"), &policy, &identity));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::ClassifiedHost;

/// Loopback names always allowed, compared case-insensitively.
pub const LOOPBACK_NAMES: [&str; 4] = [
    "localhost",
    "127.0.0.1",
    "::1",
    "0000:0000:0000:0000:0000:0000:0000:0001",
];

/// Suffix for `*.localhost` subdomains
const LOCALHOST_SUFFIX: &str = ".localhost";

/// Keyword that disables the guard entirely
pub const ALLOW_ALL_KEYWORD: &str = "all";

// =============================================================================
// Host Patterns
// =============================================================================

/// A single allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Exact hostname, lowercased
    Exact(String),
    /// `.suffix` wildcard; stored lowercased and with its leading dot
    Wildcard(String),
}

impl HostPattern {
    /// Parse a configured pattern. A leading `.` makes it a wildcard.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }

        let lowered = pattern.to_ascii_lowercase();
        if lowered.starts_with('.') {
            Ok(HostPattern::Wildcard(lowered))
        } else {
            Ok(HostPattern::Exact(lowered))
        }
    }

    /// Match a hostname against this pattern, ignoring ASCII case.
    ///
    /// A wildcard matches its bare parent domain and any subdomain of it:
    /// `.acme.com` matches `acme.com` and `a.b.acme.com` but not `fooacme.com`.
    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            HostPattern::Exact(name) => hostname.eq_ignore_ascii_case(name),
            HostPattern::Wildcard(dotted) => {
                hostname.eq_ignore_ascii_case(&dotted[1..]) || ends_with_ignore_case(hostname, dotted)
            }
        }
    }

    /// The pattern as configured (lowercased).
    pub fn as_str(&self) -> &str {
        match self {
            HostPattern::Exact(s) | HostPattern::Wildcard(s) => s,
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value.is_char_boundary(value.len() - suffix.len())
        && value[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

// =============================================================================
// Allow Policy
// =============================================================================

/// Accepted shapes of the `hosts` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostsOption {
    /// `"all"` or a single pattern
    One(String),
    /// Ordered list of patterns, possibly empty
    Many(Vec<String>),
}

/// Operator-supplied allow policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HostsOption")]
pub enum AllowPolicy {
    /// Bypass every check
    All,
    /// No explicit hosts; only the implicit rules apply
    #[default]
    Empty,
    /// Explicit patterns
    List(Vec<HostPattern>),
}

impl AllowPolicy {
    /// Build a list policy from pattern strings.
    ///
    /// An empty iterator yields [`AllowPolicy::Empty`].
    pub fn list<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| HostPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            Ok(AllowPolicy::Empty)
        } else {
            Ok(AllowPolicy::List(patterns))
        }
    }

    /// Whether the policy disables the guard.
    pub fn is_all(&self) -> bool {
        matches!(self, AllowPolicy::All)
    }

    /// Configured patterns (empty for `All` and `Empty`).
    pub fn patterns(&self) -> &[HostPattern] {
        match self {
            AllowPolicy::List(patterns) => patterns,
            AllowPolicy::All | AllowPolicy::Empty => &[],
        }
    }

    /// First pattern matching the hostname, if any.
    pub fn find_match(&self, hostname: &str) -> Option<&HostPattern> {
        self.patterns().iter().find(|p| p.matches(hostname))
    }
}

impl TryFrom<HostsOption> for AllowPolicy {
    type Error = ConfigError;

    fn try_from(option: HostsOption) -> Result<Self, Self::Error> {
        match option {
            HostsOption::One(value) if value == ALLOW_ALL_KEYWORD => Ok(AllowPolicy::All),
            HostsOption::One(value) => AllowPolicy::list([value]),
            HostsOption::Many(values) => AllowPolicy::list(values),
        }
    }
}

impl From<&AllowPolicy> for HostsOption {
    fn from(policy: &AllowPolicy) -> Self {
        match policy {
            AllowPolicy::All => HostsOption::One(ALLOW_ALL_KEYWORD.to_string()),
            AllowPolicy::Empty => HostsOption::Many(Vec::new()),
            AllowPolicy::List(patterns) => {
                HostsOption::Many(patterns.iter().map(|p| p.as_str().to_string()).collect())
            }
        }
    }
}

impl Serialize for AllowPolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        HostsOption::from(self).serialize(serializer)
    }
}

// =============================================================================
// Server Identity
// =============================================================================

/// Hostname the server itself is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerIdentity(Option<String>);

impl ServerIdentity {
    /// Identity for a server bound to `host`. Empty strings mean no identity.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        if host.is_empty() {
            Self(None)
        } else {
            Self(Some(host))
        }
    }

    /// No implicit self-match.
    pub fn none() -> Self {
        Self(None)
    }

    /// The bind hostname, if any.
    pub fn host(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Exact, case-insensitive comparison against the bind hostname.
    pub fn matches(&self, hostname: &str) -> bool {
        self.host()
            .is_some_and(|host| host.eq_ignore_ascii_case(hostname))
    }
}

impl From<Option<String>> for ServerIdentity {
    fn from(host: Option<String>) -> Self {
        host.map(Self::new).unwrap_or_default()
    }
}

// =============================================================================
// Decision
// =============================================================================

/// Why a host was allowed. For operator logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowReason {
    /// Policy is `All`
    AllowAll,
    /// `file:` or `*-extension:` value
    TrustedScheme,
    /// `localhost` variant or `*.localhost`
    Loopback,
    /// Matches the server's bind hostname
    ServerIdentity,
    /// IPv4 or IPv6 literal
    IpLiteral,
    /// Matches a configured pattern
    Pattern(String),
}

/// Why a host was denied. For operator logs only; never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Header absent, empty or unparsable
    InvalidHeader,
    /// Hostname matched no rule
    NotAllowed,
}

impl DenyReason {
    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::InvalidHeader => "invalid_header",
            DenyReason::NotAllowed => "not_allowed",
        }
    }
}

/// Outcome of evaluating a host against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed
    Allowed(AllowReason),
    /// Request must be rejected
    Denied(DenyReason),
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allowed(AllowReason::Pattern(p)) => write!(f, "allowed (pattern {})", p),
            Decision::Allowed(reason) => write!(f, "allowed ({:?})", reason),
            Decision::Denied(reason) => write!(f, "denied ({})", reason.as_str()),
        }
    }
}

/// Whether a hostname is `localhost`, a loopback literal, or a `.localhost` subdomain.
pub fn is_loopback_name(hostname: &str) -> bool {
    LOOPBACK_NAMES
        .iter()
        .any(|name| hostname.eq_ignore_ascii_case(name))
        || ends_with_ignore_case(hostname, LOCALHOST_SUFFIX)
}

/// Evaluate a classified host, keeping the rule that decided it.
pub fn evaluate(
    classified: &ClassifiedHost,
    policy: &AllowPolicy,
    server: &ServerIdentity,
) -> Decision {
    if policy.is_all() {
        return Decision::Allowed(AllowReason::AllowAll);
    }

    let hostname = match classified {
        ClassifiedHost::Invalid => return Decision::Denied(DenyReason::InvalidHeader),
        ClassifiedHost::TrustedScheme => return Decision::Allowed(AllowReason::TrustedScheme),
        ClassifiedHost::Ipv4(_) | ClassifiedHost::Ipv6(_) => None,
        ClassifiedHost::Hostname(name) => Some(name.as_str()),
    };

    if let Some(name) = hostname {
        if is_loopback_name(name) {
            return Decision::Allowed(AllowReason::Loopback);
        }
        if server.matches(name) {
            return Decision::Allowed(AllowReason::ServerIdentity);
        }
    }

    let Some(name) = hostname else {
        return Decision::Allowed(AllowReason::IpLiteral);
    };

    match policy.find_match(name) {
        Some(pattern) => Decision::Allowed(AllowReason::Pattern(pattern.as_str().to_string())),
        None => Decision::Denied(DenyReason::NotAllowed),
    }
}

/// Whether a classified host may proceed.
pub fn is_allowed(classified: &ClassifiedHost, policy: &AllowPolicy, server: &ServerIdentity) -> bool {
    evaluate(classified, policy, server).is_allowed()
}
