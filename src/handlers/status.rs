//! Status and health check handlers for the DevHost Guard server.
//!
//! - `/health` - Simple health check
//! - `/status` - Server status with the active guard policy and decision counters
//! - `/metrics` - Decision counters in Prometheus text format
//!
//! # Example Response
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "name": "devhost-guard",
//!   "uptime_seconds": 3600,
//!   "guard": {
//!     "hosts": [".acme.com"],
//!     "server_host": "127.0.0.1",
//!     "reject_status": 400
//!   },
//!   "decisions": { "requests_total": 12, "allowed_total": 11, "denied_total": 1 },
//!   "status": "running",
//!   "timestamp": "2026-01-01T12:00:00+00:00"
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GuardConfig;
use crate::metrics::{GuardMetrics, MetricsSnapshot};

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Response Types
// ============================================================================

/// Health check response for simple liveness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Detailed server status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server version (from Cargo.toml)
    pub version: String,

    /// Server name
    pub name: String,

    /// Server uptime in seconds
    pub uptime_seconds: u64,

    /// Active guard configuration
    pub guard: GuardConfig,

    /// Decision counters since startup
    pub decisions: MetricsSnapshot,

    /// Server status (always "running" if responding)
    pub status: String,

    /// RFC 3339 timestamp of when status was generated
    pub timestamp: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the status endpoints.
#[derive(Debug)]
pub struct AppState {
    start_time: Instant,
    config: Arc<GuardConfig>,
    metrics: Arc<GuardMetrics>,
}

impl AppState {
    /// Create state for a server running with `config`.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            start_time: Instant::now(),
            config: Arc::new(config),
            metrics: Arc::new(GuardMetrics::new()),
        }
    }

    /// Get the server uptime in seconds.
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Shared guard configuration.
    #[inline]
    pub fn config(&self) -> &Arc<GuardConfig> {
        &self.config
    }

    /// Shared decision counters.
    #[inline]
    pub fn metrics(&self) -> &Arc<GuardMetrics> {
        &self.metrics
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// # Route
/// `GET /health`
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// Detailed status endpoint handler.
///
/// # Route
/// `GET /status`
#[instrument(skip_all)]
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Status check requested");

    let response = StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVER_NAME.to_string(),
        uptime_seconds: state.uptime_seconds(),
        guard: GuardConfig::clone(state.config()),
        decisions: state.metrics().snapshot(),
        status: "running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}

/// Prometheus metrics endpoint handler.
///
/// # Route
/// `GET /metrics`
#[instrument(skip_all)]
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics().to_prometheus_format(),
    )
}

/// Create the status router with all health and status endpoints.
pub fn status_router() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;

    axum::Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
}

// ============================================================================
// Tests
// ============================================================================
