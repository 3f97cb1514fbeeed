//! HTTP handlers for the DevHost Guard demo server

pub mod status;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::HostGuardLayer;

pub use status::{
    health_handler, metrics_handler, status_handler, status_router, AppState, HealthResponse,
    StatusResponse,
};

/// Body served at `/`
pub const INDEX_BODY: &str = "Hello World";

/// Index page handler.
pub async fn index_handler() -> &'static str {
    INDEX_BODY
}

/// Build the full application router.
///
/// Every route, including `/health`, sits behind the host guard so a
/// rebinding page cannot probe the server at all.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use devhost_guard::config::GuardConfig;
/// use devhost_guard::handlers::{app_router, AppState};
///
/// let app = app_router(Arc::new(AppState::new(GuardConfig::default())));
/// ```
pub fn app_router(state: Arc<AppState>) -> Router {
    let guard = HostGuardLayer::from_shared(Arc::clone(state.config()))
        .with_metrics(Arc::clone(state.metrics()));

    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .merge(status_router())
        .with_state(state)
        .layer(guard)
        .layer(TraceLayer::new_for_http())
}
