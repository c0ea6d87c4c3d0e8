//! Admin API subsystem.
//!
//! # Responsibilities
//! - Serve read-only JSON views of proxy state on a separate listener
//! - Require a bearer token on every route
//!
//! # Design Decisions
//! - Separate port from proxy traffic; never reachable through the proxy
//! - No mutating endpoints: the cache has no eviction or purge

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::cache::CacheStore;
use crate::net::ConnectionTracker;

use self::auth::admin_auth_middleware;
use self::handlers::{get_cache, get_status};

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: CacheStore,
    pub tracker: ConnectionTracker,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(store: CacheStore, tracker: ConnectionTracker, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            tracker,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache", get(get_cache))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin router until `shutdown` fires.
pub async fn serve_admin(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
