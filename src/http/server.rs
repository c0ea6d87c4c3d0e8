//! Proxy server accept loop.
//!
//! # Responsibilities
//! - Accept client connections from the bounded listener
//! - Spawn one isolated session task per connection
//! - Attach a tracing span (connection id, session id, peer) to each session
//! - Record per-session outcomes
//! - Stop accepting on shutdown and drain live sessions
//!
//! # Design Decisions
//! - A failing or panicking session never affects the accept loop
//! - The listener permit and tracker guard live inside the session task,
//!   so slots are released on every exit path

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::config::{ClientConfig, ProxyConfig};
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::origin::{OriginConnector, TcpOriginConnector};
use crate::proxy::{ProxyHandler, Session, SessionError, SessionOutcome};

/// Pause after a failed accept (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// The caching forward proxy.
pub struct ProxyServer<C = TcpOriginConnector> {
    handler: ProxyHandler<C>,
    limits: ClientConfig,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl ProxyServer<TcpOriginConnector> {
    /// Create a server that talks to origins over plain TCP.
    pub fn new(config: &ProxyConfig, store: CacheStore) -> Self {
        let connector = TcpOriginConnector::new(&config.origin);
        Self::with_connector(config, store, connector)
    }
}

impl<C: OriginConnector> ProxyServer<C> {
    pub fn with_connector(config: &ProxyConfig, store: CacheStore, connector: C) -> Self {
        Self {
            handler: ProxyHandler::new(store, connector, config.origin.user_agent.as_str()),
            limits: config.client.clone(),
            tracker: ConnectionTracker::new(),
            drain_timeout: config.shutdown.drain_timeout(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        self.handler.store()
    }

    /// Handle to the live-session tracker, shared with the admin API.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires, then drain live sessions.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                max_connections = listener.max_connections(),
                "Proxy server starting"
            );
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_session(stream, peer, permit),
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        drop(listener);
        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(
                active_sessions = active,
                drain_timeout_secs = self.drain_timeout.as_secs(),
                "Draining sessions"
            );
        }
        if !self.tracker.wait_idle(self.drain_timeout).await {
            tracing::warn!(
                active_sessions = self.tracker.active_count(),
                "Drain timeout elapsed, abandoning sessions"
            );
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let span = tracing::info_span!(
            "session",
            connection_id = %guard.id(),
            session_id = %Uuid::new_v4(),
            peer = %peer
        );
        let session = Session::new(stream, self.handler.clone(), self.limits.clone());

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                supervise(session.run()).await;
            }
            .instrument(span),
        );
    }
}

/// Drive one session to completion, recording how it ended.
///
/// Returns the outcome label. A panic is caught here and reported as
/// `panicked`.
async fn supervise<F>(session: F) -> &'static str
where
    F: Future<Output = Result<SessionOutcome, SessionError>>,
{
    let label = match AssertUnwindSafe(session).catch_unwind().await {
        Ok(Ok(outcome)) => {
            tracing::info!(outcome = outcome.as_str(), "Session finished");
            outcome.as_str()
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Session failed");
            "client_error"
        }
        Err(payload) => {
            tracing::error!(panic = panic_message(payload.as_ref()), "Session panicked");
            "panicked"
        }
    };
    metrics::record_session(label);
    label
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
