//! Host guard middleware for Tower-based HTTP servers (axum, hyper)
//!
//! [`HostGuardLayer`] wraps a service and checks every request's `Host`
//! header before it reaches the inner service. Allowed requests pass through
//! unchanged; denied requests are answered directly with the configured
//! status and a fixed `Invalid Host header` body. The body never says why a
//! host was denied; the reason only goes to the server log.
//!
//! # Request Flow
//!
//! ```text
//! Request ──▶ Host header ──▶ classify ──▶ evaluate ──┬─▶ allowed ──▶ inner service
//!                                                    └─▶ denied  ──▶ 400/403 "Invalid Host header"
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use devhost_guard::config::GuardConfig;
//! use devhost_guard::middleware::HostGuardLayer;
//! use devhost_guard::policy::AllowPolicy;
//!
//! let config = GuardConfig::new()
//!     .with_hosts(AllowPolicy::list([".acme.com"]).unwrap())
//!     .with_server_host("127.0.0.1");
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello World" }))
//!     .layer(HostGuardLayer::new(config));
//! ```

use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use futures::future::{self, Either, Ready};
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::config::{GuardConfig, RejectStatus, REJECTION_BODY};
use crate::metrics::GuardMetrics;
use crate::policy::Decision;

/// Layer that installs [`HostGuard`] around a service.
#[derive(Debug, Clone)]
pub struct HostGuardLayer {
    config: Arc<GuardConfig>,
    metrics: Option<Arc<GuardMetrics>>,
}

impl HostGuardLayer {
    /// Create a layer from configuration.
    pub fn new(config: GuardConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    /// Create a layer sharing an existing configuration.
    pub fn from_shared(config: Arc<GuardConfig>) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Record every decision into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<GuardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The guard configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

impl<S> Layer<S> for HostGuardLayer {
    type Service = HostGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HostGuard {
            inner,
            config: Arc::clone(&self.config),
            metrics: self.metrics.clone(),
        }
    }
}

/// Service that rejects requests whose `Host` header is not allowed.
#[derive(Debug, Clone)]
pub struct HostGuard<S> {
    inner: S,
    config: Arc<GuardConfig>,
    metrics: Option<Arc<GuardMetrics>>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for HostGuard<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<Body>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let decision = decide_request(&request, &self.config);

        if let Some(metrics) = &self.metrics {
            metrics.record(&decision);
        }

        if decision.is_allowed() {
            Either::Right(self.inner.call(request))
        } else {
            Either::Left(future::ready(Ok(rejection_response(
                self.config.reject_status,
            ))))
        }
    }
}

/// Host value of a request.
///
/// Uses the `Host` header when present. HTTP/2 requests carry the host in
/// the `:authority` pseudo-header instead, which surfaces as the URI
/// authority. A `Host` header that is not visible ASCII yields `None`.
pub fn request_host<B>(request: &Request<B>) -> Option<Cow<'_, str>> {
    match request.headers().get(HOST) {
        Some(value) => value.to_str().ok().map(Cow::Borrowed),
        None => request
            .uri()
            .authority()
            .map(|authority| Cow::Borrowed(authority.as_str())),
    }
}

/// Evaluate a request against the guard configuration and log the outcome.
pub fn decide_request<B>(request: &Request<B>, config: &GuardConfig) -> Decision {
    let host = request_host(request);
    let decision = config.decide(host.as_deref());

    match &decision {
        Decision::Allowed(reason) => {
            debug!(host = host.as_deref().unwrap_or(""), ?reason, "Host header allowed");
        }
        Decision::Denied(reason) => {
            warn!(
                host = host.as_deref().unwrap_or(""),
                reason = reason.as_str(),
                path = %request.uri().path(),
                "Rejected request with invalid Host header (possible DNS rebinding attack)"
            );
        }
    }

    decision
}

/// Response sent for a denied host.
pub fn rejection_response(status: RejectStatus) -> Response<Body> {
    let mut response = Response::new(Body::from(REJECTION_BODY));
    *response.status_mut() = status.status_code();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
