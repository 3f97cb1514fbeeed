//! Host header classification
//!
//! Turns the raw value of an inbound `Host` header into a [`ClassifiedHost`]
//! that the policy matcher can reason about. Classification is purely
//! syntactic: no DNS lookups, no I/O, and no panics on malformed input.
//!
//! # Classification Order
//!
//! ```text
//! raw header ──▶ empty? ──▶ Invalid
//!                  │
//!                  ▼
//!         file: / *-extension: ──▶ TrustedScheme
//!                  │
//!                  ▼
//!      authority (strip scheme, path, userinfo, port, brackets)
//!                  │
//!                  ▼
//!      dotted-quad ──▶ Ipv4      IPv6 literal ──▶ Ipv6
//!                  │
//!                  ▼
//!               Hostname
//! ```
//!
//! # Example
//!
//! ```rust
//! use devhost_guard::host::{classify, ClassifiedHost};
//!
//! assert_eq!(
//!     classify(Some("acme.com:5173")),
//!     ClassifiedHost::Hostname("acme.com".to_string())
//! );
//! assert_eq!(classify(Some("chrome-extension://abc/index.html")), ClassifiedHost::TrustedScheme);
//! assert_eq!(classify(None), ClassifiedHost::Invalid);
//! ```

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use regex::Regex;

/// Non-network schemes that carry no meaningful host component.
const TRUSTED_SCHEME_PATTERN: &str = r"(?i)^(file|[a-z][a-z0-9+.-]*-extension):";

/// Optional scheme followed by `//`, i.e. a value that already has an authority marker.
///
/// The scheme is limited to scheme characters so a later `://` in the path
/// or query never moves the authority.
const AUTHORITY_PREFIX_PATTERN: &str = r"^([A-Za-z][A-Za-z0-9+.-]*:)?//";

fn trusted_scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TRUSTED_SCHEME_PATTERN).expect("trusted scheme pattern is valid"))
}

fn authority_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(AUTHORITY_PREFIX_PATTERN).expect("authority prefix pattern is valid")
    })
}

/// Result of classifying a raw `Host` header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassifiedHost {
    /// `file:` or `*-extension:` value, exempt from hostname checks
    TrustedScheme,
    /// Dotted-quad IPv4 literal
    Ipv4(Ipv4Addr),
    /// IPv6 literal (brackets already removed)
    Ipv6(Ipv6Addr),
    /// Any other hostname, case preserved as received
    Hostname(String),
    /// Empty, absent or unparsable header
    Invalid,
}

impl ClassifiedHost {
    /// Whether the header could not be classified.
    pub fn is_invalid(&self) -> bool {
        matches!(self, ClassifiedHost::Invalid)
    }

    /// Whether the header is an IPv4 or IPv6 literal.
    pub fn is_ip_literal(&self) -> bool {
        matches!(self, ClassifiedHost::Ipv4(_) | ClassifiedHost::Ipv6(_))
    }

    /// The hostname, for [`ClassifiedHost::Hostname`] only.
    pub fn hostname(&self) -> Option<&str> {
        match self {
            ClassifiedHost::Hostname(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ClassifiedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedHost::TrustedScheme => f.write_str("<trusted-scheme>"),
            ClassifiedHost::Ipv4(addr) => write!(f, "{}", addr),
            ClassifiedHost::Ipv6(addr) => write!(f, "[{}]", addr),
            ClassifiedHost::Hostname(name) => f.write_str(name),
            ClassifiedHost::Invalid => f.write_str("<invalid>"),
        }
    }
}

/// Authority component extracted from a header value.
///
/// Borrowed from the header; nothing is allocated until a
/// [`ClassifiedHost::Hostname`] is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority<'a> {
    /// Host text with brackets, userinfo and port removed
    pub host: &'a str,
    /// Whether the host was written as `[...]`
    pub bracketed: bool,
    /// Port digits, if a non-empty port was present
    pub port: Option<&'a str>,
}

impl<'a> Authority<'a> {
    /// Extract the authority from a header value.
    ///
    /// Values without a leading `[scheme:]//` are treated as if one were
    /// present, so `acme.com:80` and `http://acme.com:80/path` yield the
    /// same authority.
    ///
    /// Returns `None` when the value cannot be split into host and port,
    /// e.g. an unterminated `[` or garbage after `]`.
    pub fn parse(header: &'a str) -> Option<Self> {
        let rest = match authority_prefix_regex().find(header) {
            Some(prefix) => &header[prefix.end()..],
            None => header,
        };

        let end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let authority = &rest[..end];

        // userinfo ends at the last '@'
        let authority = authority
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or(authority);

        if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, tail) = bracketed.split_once(']')?;
            let port = match tail {
                "" => None,
                _ => Some(port_digits(tail.strip_prefix(':')?)?),
            };
            return Some(Self {
                host,
                bracketed: true,
                port: port.filter(|p| !p.is_empty()),
            });
        }

        // Unbracketed IPv6 literals (`::1`) have no room for a port.
        if authority.parse::<Ipv6Addr>().is_ok() {
            return Some(Self {
                host: authority,
                bracketed: false,
                port: None,
            });
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) if port_digits(port).is_some() => (host, Some(port)),
            _ => (authority, None),
        };

        Some(Self {
            host,
            bracketed: false,
            port: port.filter(|p| !p.is_empty()),
        })
    }

    /// Port as a number, when present and in range.
    pub fn port_number(&self) -> Option<u16> {
        self.port.and_then(|p| p.parse().ok())
    }
}

fn port_digits(port: &str) -> Option<&str> {
    port.bytes().all(|b| b.is_ascii_digit()).then_some(port)
}

/// Whether the header starts with a trusted non-network scheme.
pub fn is_trusted_scheme(header: &str) -> bool {
    trusted_scheme_regex().is_match(header)
}

/// Classify a raw `Host` header value.
///
/// `None` and `Some("")` are both [`ClassifiedHost::Invalid`].
pub fn classify(raw: Option<&str>) -> ClassifiedHost {
    let header = match raw {
        Some(h) if !h.is_empty() => h,
        _ => return ClassifiedHost::Invalid,
    };

    // Must run before authority parsing: these values have no host.
    if is_trusted_scheme(header) {
        return ClassifiedHost::TrustedScheme;
    }

    match Authority::parse(header) {
        Some(authority) => classify_authority(&authority),
        None => ClassifiedHost::Invalid,
    }
}

/// Classify a header value that is known to be present.
pub fn classify_str(raw: &str) -> ClassifiedHost {
    classify(Some(raw))
}

fn classify_authority(authority: &Authority<'_>) -> ClassifiedHost {
    let host = authority.host;
    if host.is_empty() {
        return ClassifiedHost::Invalid;
    }

    // Brackets are reserved for IPv6 literals.
    if authority.bracketed {
        return host
            .parse::<Ipv6Addr>()
            .map(ClassifiedHost::Ipv6)
            .unwrap_or(ClassifiedHost::Invalid);
    }

    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return ClassifiedHost::Ipv4(addr);
    }

    if let Ok(addr) = host.parse::<Ipv6Addr>() {
        return ClassifiedHost::Ipv6(addr);
    }

    if host.contains(':') {
        return ClassifiedHost::Invalid;
    }

    ClassifiedHost::Hostname(host.to_string())
}
