//! DevHost Guard - Host Header Protection for Local Development Servers
//!
//! Development servers that bind to a permissive address can be reached by
//! any web page through DNS rebinding: the attacker's domain resolves to
//! `127.0.0.1` and the browser happily sends requests with
//! `Host: attacker.example`. This crate rejects such requests by checking the
//! `Host` header against a small allow policy.
//!
//! # Features
//!
//! - **Host Classifier**: syntactic parsing of `Host` values into trusted
//!   schemes, IP literals and hostnames (no DNS)
//! - **Policy Matcher**: ordered allow rules for `localhost`, IP literals,
//!   the server's own host, exact and `.wildcard` patterns
//! - **Middleware**: a `tower` layer for axum/hyper servers
//! - **Demo Server**: `devhost-guard` binary serving a guarded page
//!
//! # Architecture
//!
//! ```text
//! Request ──▶ HostGuardLayer ──▶ classify(Host) ──▶ evaluate(policy, server host)
//!                  │                                          │
//!                  ▼                                          ▼
//!           inner service  ◀──── allowed          denied ────▶ 400/403
//!                                                            "Invalid Host header"
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use devhost_guard::{classify, is_allowed, AllowPolicy, ServerIdentity};
//!
//! let policy = AllowPolicy::list([".acme.com"]).unwrap();
//! let server = ServerIdentity::new("127.0.0.1");
//!
//! assert!(is_allowed(&classify(Some("www.acme.com:5173")), &policy, &server));
//! assert!(is_allowed(&classify(Some("localhost:5173")), &policy, &server));
//! assert!(!is_allowed(&classify(Some("attacker.example")), &policy, &server));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod host;
pub mod metrics;
pub mod middleware;
pub mod policy;

// Re-exports for convenience
pub use config::{GuardConfig, RejectStatus};
pub use error::{ConfigError, Error, Result};
pub use host::{classify, ClassifiedHost};
pub use metrics::GuardMetrics;
pub use middleware::{HostGuard, HostGuardLayer};
pub use policy::{evaluate, is_allowed, AllowPolicy, Decision, HostPattern, ServerIdentity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
