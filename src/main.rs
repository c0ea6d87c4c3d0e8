//! Caching forward HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::ProxyServer ──▶ proxy::Session
//!                                                            │
//!                                     ┌──────────────────────┤
//!                                     ▼                      ▼
//!                               cache::CacheStore     origin::TcpOriginConnector ──▶ Origin
//!
//!     Admin client ──▶ admin router (bearer auth) ──▶ cache snapshot / status
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use caching_proxy::admin::{serve_admin, setup_admin_router, AdminState};
use caching_proxy::config::load_or_default;
use caching_proxy::lifecycle::{wait_for_signal, Shutdown};
use caching_proxy::net::Listener;
use caching_proxy::observability::{logging, metrics};
use caching_proxy::{CacheStore, ProxyServer};

#[derive(Parser)]
#[command(name = "caching-proxy", version)]
#[command(about = "Caching forward HTTP proxy with conditional revalidation", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "caching-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        idle_timeout_ms = config.client.idle_timeout_ms,
        origin_timeout_secs = config.origin.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = Listener::bind(&config.listener)?;
    let store = CacheStore::new();
    let server = ProxyServer::new(&config, store.clone());
    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(store, server.tracker(), config.admin.api_key.as_str());
        Some(tokio::spawn(serve_admin(
            admin_listener,
            setup_admin_router(state),
            shutdown.subscribe(),
        )))
    } else {
        None
    };

    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let result = server.run(listener, server_shutdown).await;
    shutdown.trigger();

    if let Some(task) = admin_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
        }
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
