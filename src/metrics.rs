//! Decision counters for host guard observability
//!
//! Lock-free counters of allow/deny outcomes, broken down by the rule that
//! fired, with Prometheus text export. Counters are write-only from the
//! decision path and never influence a decision.
//!
//! # Example
//!
//! ```rust
//! use devhost_guard::metrics::GuardMetrics;
//! use devhost_guard::policy::{Decision, DenyReason};
//!
//! let metrics = GuardMetrics::new();
//! metrics.record(&Decision::Denied(DenyReason::NotAllowed));
//!
//! assert_eq!(metrics.snapshot().denied_total, 1);
//! assert!(metrics.to_prometheus_format().contains("devhost_guard_denied_total 1"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::policy::{AllowReason, Decision, DenyReason};

/// Host guard decision counters
#[derive(Debug, Default)]
pub struct GuardMetrics {
    // === Totals ===
    requests_total: AtomicU64,
    allowed_total: AtomicU64,
    denied_total: AtomicU64,

    // === Allow breakdown ===
    allowed_all: AtomicU64,
    allowed_trusted_scheme: AtomicU64,
    allowed_loopback: AtomicU64,
    allowed_server_host: AtomicU64,
    allowed_ip_literal: AtomicU64,
    allowed_pattern: AtomicU64,

    // === Deny breakdown ===
    denied_invalid_header: AtomicU64,
    denied_not_allowed: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests evaluated
    pub requests_total: u64,
    /// Requests allowed
    pub allowed_total: u64,
    /// Requests denied
    pub denied_total: u64,
    /// Allowed because the policy is `all`
    pub allowed_all: u64,
    /// Allowed as `file:` / `*-extension:`
    pub allowed_trusted_scheme: u64,
    /// Allowed as a localhost variant
    pub allowed_loopback: u64,
    /// Allowed as the server's own host
    pub allowed_server_host: u64,
    /// Allowed as an IP literal
    pub allowed_ip_literal: u64,
    /// Allowed by a configured pattern
    pub allowed_pattern: u64,
    /// Denied for a missing or malformed header
    pub denied_invalid_header: u64,
    /// Denied because nothing matched
    pub denied_not_allowed: u64,
}

impl GuardMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision.
    pub fn record(&self, decision: &Decision) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match decision {
            Decision::Allowed(reason) => {
                self.allowed_total.fetch_add(1, Ordering::Relaxed);
                let counter = match reason {
                    AllowReason::AllowAll => &self.allowed_all,
                    AllowReason::TrustedScheme => &self.allowed_trusted_scheme,
                    AllowReason::Loopback => &self.allowed_loopback,
                    AllowReason::ServerIdentity => &self.allowed_server_host,
                    AllowReason::IpLiteral => &self.allowed_ip_literal,
                    AllowReason::Pattern(_) => &self.allowed_pattern,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Decision::Denied(reason) => {
                self.denied_total.fetch_add(1, Ordering::Relaxed);
                let counter = match reason {
                    DenyReason::InvalidHeader => &self.denied_invalid_header,
                    DenyReason::NotAllowed => &self.denied_not_allowed,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_total: load(&self.requests_total),
            allowed_total: load(&self.allowed_total),
            denied_total: load(&self.denied_total),
            allowed_all: load(&self.allowed_all),
            allowed_trusted_scheme: load(&self.allowed_trusted_scheme),
            allowed_loopback: load(&self.allowed_loopback),
            allowed_server_host: load(&self.allowed_server_host),
            allowed_ip_literal: load(&self.allowed_ip_literal),
            allowed_pattern: load(&self.allowed_pattern),
            denied_invalid_header: load(&self.denied_invalid_header),
            denied_not_allowed: load(&self.denied_not_allowed),
        }
    }

    /// Convert metrics to Prometheus text format
    pub fn to_prometheus_format(&self) -> String {
        let s = self.snapshot();
        let mut output = String::new();

        output.push_str("# TYPE devhost_guard_requests_total counter\n");
        output.push_str(&format!("devhost_guard_requests_total {}\n", s.requests_total));
        output.push_str("# TYPE devhost_guard_allowed_total counter\n");
        output.push_str(&format!("devhost_guard_allowed_total {}\n", s.allowed_total));
        output.push_str("# TYPE devhost_guard_denied_total counter\n");
        output.push_str(&format!("devhost_guard_denied_total {}\n", s.denied_total));

        output.push_str("# TYPE devhost_guard_decisions_total counter\n");
        for (outcome, reason, value) in [
            ("allowed", "all", s.allowed_all),
            ("allowed", "trusted_scheme", s.allowed_trusted_scheme),
            ("allowed", "loopback", s.allowed_loopback),
            ("allowed", "server_host", s.allowed_server_host),
            ("allowed", "ip_literal", s.allowed_ip_literal),
            ("allowed", "pattern", s.allowed_pattern),
            ("denied", DenyReason::InvalidHeader.as_str(), s.denied_invalid_header),
            ("denied", DenyReason::NotAllowed.as_str(), s.denied_not_allowed),
        ] {
            output.push_str(&format!(
                "devhost_guard_decisions_total{{outcome=\"{}\",reason=\"{}\"}} {}\n",
                outcome, reason, value
            ));
        }

        output
    }
}
