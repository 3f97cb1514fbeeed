//! DevHost Guard demo server
//!
//! Serves a small page behind the host guard, for trying out allow policies.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use devhost_guard::config::{parse_hosts_list, GuardConfig, RejectStatus};
use devhost_guard::handlers::{app_router, AppState};
use devhost_guard::policy::ServerIdentity;
use tracing_subscriber::EnvFilter;

/// DevHost Guard demo server
#[derive(Parser, Debug)]
#[command(name = "devhost-guard")]
#[command(version)]
#[command(about = "Development server protected against DNS rebinding via Host header checks")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5173")]
    port: u16,

    /// Host to bind to; requests naming this host are always allowed
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Allowed host pattern (repeatable). `.acme.com` allows acme.com and its
    /// subdomains; a single `all` disables checking
    #[arg(short = 'a', long = "allowed-host", value_name = "PATTERN")]
    allowed_hosts: Vec<String>,

    /// Status code for rejected requests (400 or 403)
    #[arg(long)]
    reject_status: Option<RejectStatus>,

    /// JSON guard configuration file; replaces DEVHOST_GUARD_* variables
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> anyhow::Result<GuardConfig> {
    let mut config = match &args.config {
        Some(path) => GuardConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => GuardConfig::from_env().context("Invalid guard environment")?,
    };

    if !args.allowed_hosts.is_empty() {
        config.hosts = parse_hosts_list(&args.allowed_hosts.join(","))
            .context("Invalid --allowed-host pattern")?;
    }
    if let Some(status) = args.reject_status {
        config.reject_status = status;
    }
    config.server_host = ServerIdentity::new(args.host.clone());

    Ok(config)
}

/// `RUST_LOG` wins over `--verbose` when it parses.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose, rust_log.as_deref()))
        .init();

    let config = build_config(&args)?;
    config.log_summary();

    let state = Arc::new(AppState::new(config));
    let app = app_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("DevHost Guard server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
